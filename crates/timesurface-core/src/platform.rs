//! Host-specific glue: scheduling priority and machine description.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Ask the OS to run the calling thread under `SCHED_FIFO` at the highest
/// priority. Best-effort: usually needs root or `CAP_SYS_NICE`. Returns
/// whether the request was granted.
#[cfg(unix)]
pub fn request_realtime_priority() -> bool {
    // SAFETY: plain syscalls on the current thread with a zeroed, then
    // populated, sched_param that outlives the call.
    let rc = unsafe {
        let max = libc::sched_get_priority_max(libc::SCHED_FIFO);
        if max < 0 {
            log::debug!("sched_get_priority_max(SCHED_FIFO) failed");
            return false;
        }
        let mut param: libc::sched_param = std::mem::zeroed();
        param.sched_priority = max;
        libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param)
    };
    if rc == 0 {
        log::info!("running with SCHED_FIFO priority");
        true
    } else {
        log::debug!(
            "SCHED_FIFO request denied: {}",
            std::io::Error::from_raw_os_error(rc)
        );
        false
    }
}

#[cfg(not(unix))]
pub fn request_realtime_priority() -> bool {
    log::debug!("real-time priority is not supported on this platform");
    false
}

// ---------------------------------------------------------------------------
// Machine info
// ---------------------------------------------------------------------------

/// Machine information captured with a benchmark report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineInfo {
    pub os: String,
    pub arch: String,
    pub chip: String,
    pub cores: usize,
}

/// Detect machine information (best-effort).
pub fn detect_machine_info() -> MachineInfo {
    let os = match os_version() {
        Some(v) => format!("{} {v}", std::env::consts::OS),
        None => std::env::consts::OS.to_string(),
    };
    MachineInfo {
        os,
        arch: std::env::consts::ARCH.to_string(),
        chip: detect_chip().unwrap_or_else(|| "unknown".to_string()),
        cores: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    }
}

fn os_version() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()?;
        let v = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if v.is_empty() { None } else { Some(v) }
    }
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release").ok().and_then(|s| {
            s.lines()
                .find(|l| l.starts_with("PRETTY_NAME="))
                .map(|l| l.trim_start_matches("PRETTY_NAME=").trim_matches('"').to_string())
        })
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// CPU model string (best-effort).
fn detect_chip() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("sysctl")
            .args(["-n", "machdep.cpu.brand_string"])
            .output()
            .ok()?;
        let s = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if s.is_empty() { None } else { Some(s) }
    }
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|s| parse_cpu_model(&s))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// First `model name` line of `/proc/cpuinfo`. Some ARM kernels only expose
/// `Hardware`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|l| l.starts_with("model name") || l.starts_with("Hardware"))
        .and_then(|l| l.split_once(':'))
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_machine_info() {
        let info = detect_machine_info();
        assert!(!info.os.is_empty());
        assert!(!info.arch.is_empty());
        assert!(!info.chip.is_empty());
        assert!(info.cores > 0);
    }

    #[test]
    fn test_parse_cpu_model() {
        let cpuinfo = "processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: Intel(R) Core(TM) i9-14900K\nflags\t: fpu\n";
        assert_eq!(
            parse_cpu_model(cpuinfo).as_deref(),
            Some("Intel(R) Core(TM) i9-14900K")
        );
        assert_eq!(parse_cpu_model("Hardware\t: BCM2835\n").as_deref(), Some("BCM2835"));
        assert_eq!(parse_cpu_model("processor\t: 0\n"), None);
        assert_eq!(parse_cpu_model("model name\t:   \n"), None);
    }

    #[test]
    #[ignore] // Raises the test thread to SCHED_FIFO when run as root
    fn test_priority_request_does_not_panic() {
        let _ = request_realtime_priority();
    }
}
