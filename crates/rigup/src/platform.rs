//! Host OS/architecture detection and fragment-store folder mapping.

/// Operating systems the tool knows how to bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOs,
}

/// The target platform as seen by the assembler and the install driver.
#[derive(Debug, Clone)]
pub struct Platform {
    pub os: HostOs,
    /// Raw architecture string, shown in the plugins section header.
    pub arch: &'static str,
    arch_folder: &'static str,
}

impl Platform {
    pub fn detect() -> Self {
        let os = if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else {
            HostOs::Linux
        };
        Self::new(os, std::env::consts::ARCH, is_android())
    }

    /// `android` overrides the architecture folder: Termux-style environments
    /// keep their fragments separate from regular Linux arm ones.
    pub fn new(os: HostOs, arch: &'static str, android: bool) -> Self {
        let arch_folder = if android {
            "android"
        } else if matches!(arch, "aarch64" | "arm64") {
            "arm"
        } else {
            "intel"
        };
        Self { os, arch, arch_folder }
    }

    pub fn os_folder(&self) -> &'static str {
        match self.os {
            HostOs::Linux => "linux",
            HostOs::MacOs => "macos",
        }
    }

    pub fn display_os(&self) -> &'static str {
        match self.os {
            HostOs::Linux => "Linux",
            HostOs::MacOs => "macOS",
        }
    }

    pub fn arch_folder(&self) -> &'static str {
        self.arch_folder
    }

    /// Architecture name as the go.dev download URLs spell it.
    pub fn go_arch(&self) -> &'static str {
        match self.arch {
            "aarch64" | "arm64" => "arm64",
            _ => "amd64",
        }
    }

    /// Fragment lookup roots, most specific first.
    pub fn search_roots(&self) -> [String; 3] {
        [
            format!("zsh/{}/{}", self.os_folder(), self.arch_folder),
            format!("zsh/{}", self.os_folder()),
            "zsh/common".to_string(),
        ]
    }

    /// The same roots in scan order (least specific first), used by the
    /// filename-keyword categorize pass.
    pub fn scan_roots(&self) -> [String; 3] {
        let [most, mid, common] = self.search_roots();
        [common, mid, most]
    }
}

fn is_android() -> bool {
    std::fs::read_to_string("/proc/version")
        .map(|v| v.to_lowercase().contains("android"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_folder_maps_arm_and_intel() {
        assert_eq!(Platform::new(HostOs::Linux, "x86_64", false).arch_folder(), "intel");
        assert_eq!(Platform::new(HostOs::Linux, "aarch64", false).arch_folder(), "arm");
        assert_eq!(Platform::new(HostOs::MacOs, "arm64", false).arch_folder(), "arm");
    }

    #[test]
    fn android_overrides_arch_folder() {
        let platform = Platform::new(HostOs::Linux, "aarch64", true);
        assert_eq!(platform.arch_folder(), "android");
        assert_eq!(
            platform.search_roots()[0],
            "zsh/linux/android".to_string()
        );
    }

    #[test]
    fn search_roots_go_most_to_least_specific() {
        let platform = Platform::new(HostOs::MacOs, "aarch64", false);
        assert_eq!(
            platform.search_roots(),
            [
                "zsh/macos/arm".to_string(),
                "zsh/macos".to_string(),
                "zsh/common".to_string(),
            ]
        );
    }

    #[test]
    fn scan_roots_reverse_search_roots() {
        let platform = Platform::new(HostOs::Linux, "x86_64", false);
        assert_eq!(
            platform.scan_roots(),
            [
                "zsh/common".to_string(),
                "zsh/linux".to_string(),
                "zsh/linux/intel".to_string(),
            ]
        );
    }

    #[test]
    fn go_arch_uses_go_spelling() {
        assert_eq!(Platform::new(HostOs::Linux, "x86_64", false).go_arch(), "amd64");
        assert_eq!(Platform::new(HostOs::MacOs, "aarch64", false).go_arch(), "arm64");
    }
}
