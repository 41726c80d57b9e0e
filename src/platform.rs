//! Host platform detection and the script format that follows from it.
//!
//! The generated scripts are plain command lists. What changes between hosts:
//!
//! - the script file extension (`.bat` on Windows, `.sh` elsewhere)
//! - the command used to delete the compositing scratch file
//! - the line terminator (CRLF for batch files)
//!
//! The format is picked once at startup and handed to the emitter.

use std::fmt;

/// Detected host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux, including WSL2
    Linux,
    /// macOS
    MacOS,
    /// Windows
    Windows,
    /// Anything else; treated as a POSIX shell host
    Unknown,
}

impl Platform {
    /// Get a human-readable name for this platform
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
            Platform::Unknown => "Unknown",
        }
    }
}

/// Detect the current platform
pub fn detect_platform() -> Platform {
    #[cfg(target_os = "linux")]
    {
        Platform::Linux
    }

    #[cfg(target_os = "macos")]
    {
        Platform::MacOS
    }

    #[cfg(target_os = "windows")]
    {
        Platform::Windows
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        Platform::Unknown
    }
}

/// Extension and cleanup command of the generated scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptFormat {
    /// File extension without the dot
    pub extension: &'static str,
    /// Command that deletes a file
    pub delete_command: &'static str,
    /// Terminator written after every line
    pub line_ending: &'static str,
}

impl ScriptFormat {
    /// Windows batch files
    pub const BATCH: ScriptFormat = ScriptFormat {
        extension: "bat",
        delete_command: "del",
        line_ending: "\r\n",
    };

    /// POSIX shell scripts
    pub const SHELL: ScriptFormat = ScriptFormat {
        extension: "sh",
        delete_command: "rm",
        line_ending: "\n",
    };

    /// Format used on the given platform
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Windows => Self::BATCH,
            Platform::Linux | Platform::MacOS | Platform::Unknown => Self::SHELL,
        }
    }

    /// Format used on the current host
    pub fn host() -> Self {
        Self::for_platform(detect_platform())
    }

    /// File name of a script with the given stem, e.g. `render.sh`
    pub fn script_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.extension)
    }

    /// Line that removes `file`
    pub fn cleanup_line(&self, file: &str) -> String {
        format!("{} {}", self.delete_command, file)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
