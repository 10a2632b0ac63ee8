use psmon_common::types::MemoryUsage;
use sysinfo::System;

pub struct MemoryCollector {
    system: System,
}

impl MemoryCollector {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    pub fn collect(&mut self) -> MemoryUsage {
        self.system.refresh_memory();
        MemoryUsage::from_totals(
            self.system.total_memory(),
            self.system.available_memory(),
            self.system.total_swap(),
            self.system.free_swap(),
        )
    }
}

impl Default for MemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}
