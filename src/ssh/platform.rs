// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Target platform conventions for remote paths and directory creation.

use serde::{Deserialize, Serialize};

/// Operating system family of the remote fleet.
///
/// Controls the path separator used when building remote paths and the
/// shell idiom used to make sure a destination directory exists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RemotePlatform {
    /// Windows OpenSSH with `cmd.exe` as the default shell
    #[default]
    Windows,
    /// Any POSIX shell
    Posix,
}

impl RemotePlatform {
    pub fn separator(self) -> char {
        match self {
            RemotePlatform::Windows => '\\',
            RemotePlatform::Posix => '/',
        }
    }

    /// Destination used when a deploy action names none.
    pub fn default_destination(self) -> &'static str {
        match self {
            RemotePlatform::Windows => r"C:\sthi",
            RemotePlatform::Posix => "sthi",
        }
    }

    /// Append `name` to `dir` with exactly one separator between them.
    pub fn join(self, dir: &str, name: &str) -> String {
        let trimmed = match self {
            // Windows accepts both separators
            RemotePlatform::Windows => dir.trim_end_matches(['\\', '/']),
            RemotePlatform::Posix => dir.trim_end_matches('/'),
        };
        if trimmed.is_empty() && !dir.is_empty() {
            // Root directory
            return format!("{}{name}", self.separator());
        }
        if trimmed.is_empty() {
            return name.to_string();
        }
        format!("{trimmed}{}{name}", self.separator())
    }

    /// Shell command creating `path` (and parents) that succeeds when it
    /// already exists.
    pub fn mkdir_command(self, path: &str) -> String {
        match self {
            // cmd.exe mkdir creates intermediate directories; `|| cd .` resets errorlevel
            RemotePlatform::Windows => format!("mkdir \"{path}\" 2>nul || cd ."),
            RemotePlatform::Posix => format!("mkdir -p '{}'", path.replace('\'', r"'\''")),
        }
    }
}

impl std::fmt::Display for RemotePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemotePlatform::Windows => write!(f, "windows"),
            RemotePlatform::Posix => write!(f, "posix"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_join() {
        let p = RemotePlatform::Windows;
        assert_eq!(p.join(r"C:\sthi", "app.exe"), r"C:\sthi\app.exe");
        assert_eq!(p.join(r"C:\sthi\", "app.exe"), r"C:\sthi\app.exe");
        assert_eq!(p.join("C:/sthi/", "app.exe"), r"C:/sthi\app.exe");
    }

    #[test]
    fn test_posix_join() {
        let p = RemotePlatform::Posix;
        assert_eq!(p.join("/opt/app", "bin"), "/opt/app/bin");
        assert_eq!(p.join("/opt/app/", "bin"), "/opt/app/bin");
        assert_eq!(p.join("/", "etc"), "/etc");
        assert_eq!(p.join("", "etc"), "etc");
    }

    #[test]
    fn test_mkdir_command() {
        assert_eq!(
            RemotePlatform::Windows.mkdir_command(r"C:\sthi"),
            r#"mkdir "C:\sthi" 2>nul || cd ."#
        );
        assert_eq!(
            RemotePlatform::Posix.mkdir_command("/tmp/it's"),
            r"mkdir -p '/tmp/it'\''s'"
        );
    }

    #[test]
    fn test_deserialize_lowercase() {
        let p: RemotePlatform = serde_yaml::from_str("posix").unwrap();
        assert_eq!(p, RemotePlatform::Posix);
        assert_eq!(RemotePlatform::default(), RemotePlatform::Windows);
    }
}
