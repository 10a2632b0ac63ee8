use psmon_common::types::SystemInfo;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

/// Reads the platform identity of the current host.
///
/// Fields the OS does not report are left as empty strings.
pub fn collect_system_info() -> SystemInfo {
    let system =
        System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));
    let processor = system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .unwrap_or_default();

    SystemInfo {
        os_family: std::env::consts::FAMILY.to_string(),
        system: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
        release: System::os_version().unwrap_or_default(),
        version: System::long_os_version().unwrap_or_default(),
        kernel: System::kernel_version().unwrap_or_default(),
        hostname: System::host_name().unwrap_or_default(),
        machine: std::env::consts::ARCH.to_string(),
        processor,
        server_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_has_family_and_architecture() {
        let info = collect_system_info();
        assert_eq!(info.os_family, std::env::consts::FAMILY);
        assert_eq!(info.machine, std::env::consts::ARCH);
        assert!(!info.system.is_empty());
        assert!(!info.server_version.is_empty());
    }
}
