//! Target triple detection for release asset selection

use std::fmt;

use log::debug;

use crate::error::{InstallError, Result};

/// CPU architectures with published builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
    Aarch64,
}

impl Architecture {
    /// Map a machine name as reported by `uname -m` (or `std::env::consts::ARCH`)
    pub fn from_machine(machine: &str) -> Result<Self> {
        match machine.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "arm64" | "aarch64" => Ok(Self::Aarch64),
            _ => Err(InstallError::UnsupportedArchitecture {
                arch: machine.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

/// Operating systems with published builds, keyed by their triple suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Darwin,
    Linux,
}

impl Os {
    /// Map a kernel name as reported by `uname -s` (or `std::env::consts::OS`)
    pub fn from_kernel(kernel: &str) -> Result<Self> {
        match kernel.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            _ => Err(InstallError::UnsupportedPlatform {
                os: kernel.to_string(),
            }),
        }
    }

    pub fn platform_suffix(self) -> &'static str {
        match self {
            Self::Darwin => "apple-darwin",
            Self::Linux => "unknown-linux-gnu",
        }
    }
}

/// Canonical `{architecture}-{platform}` identifier, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetTriple(String);

impl TargetTriple {
    pub fn new(arch: Architecture, os: Os) -> Self {
        Self(format!("{}-{}", arch.as_str(), os.platform_suffix()))
    }

    /// Detect the running machine's triple, unless a non-empty override is given
    pub fn detect(override_triple: Option<&str>) -> Result<Self> {
        if let Some(triple) = override_triple.filter(|t| !t.is_empty()) {
            debug!("Using target triple override {triple}");
            return Ok(Self(triple.to_string()));
        }

        let (kernel, machine) = probe_uname();
        debug!("Probed kernel={kernel} machine={machine}");
        Self::from_uname(&kernel, &machine)
    }

    /// Build a triple from raw kernel/machine names; the OS is checked first
    pub fn from_uname(kernel: &str, machine: &str) -> Result<Self> {
        let os = Os::from_kernel(kernel)?;
        let arch = Architecture::from_machine(machine)?;
        Ok(Self::new(arch, os))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(unix)]
fn probe_uname() -> (String, String) {
    match nix::sys::utsname::uname() {
        Ok(info) => (
            info.sysname().to_string_lossy().into_owned(),
            info.machine().to_string_lossy().into_owned(),
        ),
        Err(e) => {
            log::warn!("uname failed ({e}), falling back to compile-time target");
            compile_time_target()
        }
    }
}

#[cfg(not(unix))]
fn probe_uname() -> (String, String) {
    compile_time_target()
}

fn compile_time_target() -> (String, String) {
    (
        std::env::consts::OS.to_string(),
        std::env::consts::ARCH.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_pairs_map_to_documented_triples() {
        let cases = [
            ("Darwin", "x86_64", "x86_64-apple-darwin"),
            ("Darwin", "arm64", "aarch64-apple-darwin"),
            ("Darwin", "aarch64", "aarch64-apple-darwin"),
            ("Linux", "x86_64", "x86_64-unknown-linux-gnu"),
            ("Linux", "aarch64", "aarch64-unknown-linux-gnu"),
            ("Linux", "arm64", "aarch64-unknown-linux-gnu"),
        ];
        for (kernel, machine, expect) in cases {
            let triple = TargetTriple::from_uname(kernel, machine).unwrap();
            assert_eq!(triple.as_str(), expect, "{kernel}/{machine}");
        }
    }

    #[test]
    fn unsupported_os_is_rejected() {
        for kernel in ["Windows_NT", "FreeBSD", "SunOS", ""] {
            let err = TargetTriple::from_uname(kernel, "x86_64").unwrap_err();
            assert!(
                matches!(err, InstallError::UnsupportedPlatform { ref os } if os == kernel),
                "{kernel}: {err}"
            );
        }
    }

    #[test]
    fn unsupported_arch_is_rejected() {
        for machine in ["i686", "armv7l", "ppc64le", "riscv64"] {
            let err = TargetTriple::from_uname("Linux", machine).unwrap_err();
            assert!(
                matches!(err, InstallError::UnsupportedArchitecture { ref arch } if arch == machine),
                "{machine}: {err}"
            );
        }
    }

    #[test]
    fn override_is_used_verbatim() {
        let triple = TargetTriple::detect(Some("mips-whatever-custom")).unwrap();
        assert_eq!(triple.as_str(), "mips-whatever-custom");
        assert_eq!(triple.to_string(), "mips-whatever-custom");
    }

    #[test]
    fn empty_override_falls_back_to_detection() {
        let detected = TargetTriple::detect(None);
        let empty = TargetTriple::detect(Some(""));
        assert_eq!(detected.is_ok(), empty.is_ok());
        if let (Ok(a), Ok(b)) = (detected, empty) {
            assert_eq!(a, b);
        }
    }

    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    #[test]
    fn detects_linux_x86_64() {
        let triple = TargetTriple::detect(None).unwrap();
        assert_eq!(triple.as_str(), "x86_64-unknown-linux-gnu");
    }
}
