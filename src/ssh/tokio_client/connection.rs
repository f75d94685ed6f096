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

//! SSH connection establishment.
//!
//! Resolves the hostname, tries each address in turn and authenticates on
//! the first one that completes the handshake. The whole sequence is
//! bounded by the caller's connect timeout.

use russh::client::{Config, Handle, Handler};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use std::{fmt::Debug, io};

use super::authentication::AuthMethod;

/// A ssh connection to a remote server.
///
/// After [`connect`](Client::connect)ing, use [`execute`](Client::execute)
/// to run commands and [`open_sftp`](Client::open_sftp) for transfers.
pub struct Client {
    pub(super) connection_handle: Handle<ClientHandler>,
    pub(super) username: String,
    pub(super) address: SocketAddr,
}

impl Client {
    /// Open a ssh connection to `host:port` and authenticate.
    ///
    /// Every resolved address is attempted until one connects.
    /// Authentification is tried on the first successful connection and the
    /// whole process aborted if this fails.
    pub async fn connect(
        host: &str,
        port: u16,
        username: &str,
        auth: AuthMethod,
        connect_timeout: Duration,
    ) -> Result<Self, super::Error> {
        let attempt = Self::connect_inner(host, port, username, auth, Config::default());
        match tokio::time::timeout(connect_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(super::Error::ConnectTimeout(connect_timeout.as_secs())),
        }
    }

    async fn connect_inner(
        host: &str,
        port: u16,
        username: &str,
        auth: AuthMethod,
        config: Config,
    ) -> Result<Self, super::Error> {
        let config = Arc::new(config);

        let socket_addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(super::Error::AddressInvalid)?
            .collect();

        let mut connect_res = Err(super::Error::AddressInvalid(io::Error::new(
            io::ErrorKind::InvalidInput,
            "could not resolve to any addresses",
        )));
        for socket_addr in socket_addrs {
            let handler = ClientHandler::new(host.to_string());
            match russh::client::connect(config.clone(), socket_addr, handler).await {
                Ok(h) => {
                    connect_res = Ok((socket_addr, h));
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connection to {} ({}) failed: {}", host, socket_addr, e);
                    connect_res = Err(e);
                }
            }
        }
        let (address, mut handle) = connect_res?;

        super::authentication::authenticate(&mut handle, username, auth).await?;

        Ok(Self {
            connection_handle: handle,
            username: username.to_string(),
            address,
        })
    }

    /// The username this client is connected as.
    pub fn get_connection_username(&self) -> &str {
        &self.username
    }

    /// The address this client is connected to.
    pub fn get_connection_address(&self) -> &SocketAddr {
        &self.address
    }

    /// Disconnect from the remote host.
    pub async fn disconnect(&self) -> Result<(), super::Error> {
        self.connection_handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await
            .map_err(super::Error::SshError)
    }

    /// Check if the connection is closed.
    pub fn is_closed(&self) -> bool {
        self.connection_handle.is_closed()
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("username", &self.username)
            .field("address", &self.address)
            .field("connection_handle", &"Handle<ClientHandler>")
            .finish()
    }
}

/// SSH client handler.
///
/// Fleet hosts are reinstalled often and there is no pinned host key
/// store, so every server key is trusted on first use.
#[derive(Debug, Clone)]
pub struct ClientHandler {
    hostname: String,
}

impl ClientHandler {
    pub fn new(hostname: String) -> Self {
        Self { hostname }
    }
}

impl Handler for ClientHandler {
    type Error = super::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        tracing::trace!("Accepting server key for {}", self.hostname);
        Ok(true)
    }
}
