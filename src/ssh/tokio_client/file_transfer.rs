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

//! SFTP file transfer operations.
//!
//! The remote host needs the sftp subsystem enabled (`Subsystem sftp ...`
//! in sshd_config); Windows OpenSSH ships with it on by default.

use russh_sftp::{client::SftpSession, protocol::OpenFlags};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::connection::Client;

impl Client {
    /// Start an SFTP session on a new channel.
    pub async fn open_sftp(&self) -> Result<SftpSession, super::Error> {
        let channel = self.connection_handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;
        Ok(sftp)
    }
}

/// Upload a local file, replacing any remote file at `dest_file_path`.
pub async fn upload_file<T: AsRef<Path>>(
    sftp: &SftpSession,
    src_file_path: T,
    dest_file_path: &str,
) -> Result<(), super::Error> {
    let file_contents = tokio::fs::read(src_file_path)
        .await
        .map_err(super::Error::IoError)?;

    let mut file = sftp
        .open_with_flags(
            dest_file_path,
            OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
        )
        .await?;
    file.write_all(&file_contents)
        .await
        .map_err(super::Error::IoError)?;
    file.flush().await.map_err(super::Error::IoError)?;
    file.shutdown().await.map_err(super::Error::IoError)?;

    Ok(())
}

/// Create a remote directory.
///
/// SFTP servers report an existing directory as a generic failure, so a
/// failed create is accepted when the path turns out to be a directory.
pub async fn create_dir(sftp: &SftpSession, remote_dir: &str) -> Result<(), super::Error> {
    match sftp.create_dir(remote_dir).await {
        Ok(()) => Ok(()),
        Err(create_err) => match sftp.metadata(remote_dir).await {
            Ok(metadata) if metadata.is_dir() => {
                tracing::trace!("Remote directory {} already exists", remote_dir);
                Ok(())
            }
            _ => Err(super::Error::SftpError(create_err)),
        },
    }
}
