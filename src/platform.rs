//! Host platform detection
//!
//! Decides how executables are located on PATH and whether a package
//! manager script may be launched through an explicit engine command.

/// Detected host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows - executables located with `where`
    Windows,
    /// Everything else - executables located with `which`
    Unix,
}

impl Platform {
    /// Detect the current platform
    pub fn detect() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Command line that prints the full path of `program`
    pub fn locate_command(&self, program: &str) -> Vec<String> {
        let tool = match self {
            Platform::Windows => "where",
            Platform::Unix => "which",
        };
        vec![tool.to_string(), program.to_string()]
    }

    /// Pick the executable path out of a lookup command's stdout.
    ///
    /// `where` lists every match; the `.cmd` shim is the one that can be
    /// spawned directly, so it wins when present.
    pub fn pick_located(&self, stdout: &str) -> Option<String> {
        let mut candidates = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
        match self {
            Platform::Windows => {
                let all: Vec<&str> = candidates.collect();
                all.iter()
                    .find(|c| c.to_ascii_lowercase().ends_with(".cmd"))
                    .or_else(|| all.first())
                    .map(|c| c.to_string())
            }
            Platform::Unix => candidates.next().map(str::to_string),
        }
    }

    /// Whether an explicit engine command may prefix the package manager
    pub fn allows_engine_prefix(&self) -> bool {
        matches!(self, Platform::Unix)
    }
}
