use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use log::info;
use russh::server::{Auth, Msg, Session};
use russh::{Channel, ChannelId};
use tokio::sync::Mutex;

use crate::server::ServerConfig;
use crate::sftp::SftpSession;

pub struct SshSession {
    clients: Arc<Mutex<HashMap<ChannelId, Channel<Msg>>>>,
    config: Arc<ServerConfig>,
}

impl SshSession {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    async fn take_channel(&mut self, channel_id: ChannelId) -> anyhow::Result<Channel<Msg>> {
        let mut clients = self.clients.lock().await;
        clients
            .remove(&channel_id)
            .with_context(|| format!("unknown channel {channel_id:?}"))
    }
}

impl russh::server::Handler for SshSession {
    type Error = anyhow::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        info!("password auth attempt for user '{}'", user);
        if user == self.config.username && password == self.config.password {
            Ok(Auth::Accept)
        } else {
            Ok(Auth::Reject {
                proceed_with_methods: None,
                partial_success: false,
            })
        }
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        {
            let mut clients = self.clients.lock().await;
            clients.insert(channel.id(), channel);
        }
        Ok(true)
    }

    async fn channel_eof(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.close(channel)?;
        Ok(())
    }

    async fn subsystem_request(
        &mut self,
        channel_id: ChannelId,
        name: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        info!("subsystem request: {}", name);

        if name == "sftp" {
            let channel = self.take_channel(channel_id).await?;
            let sftp = SftpSession::new(self.config.clone());
            session.channel_success(channel_id)?;
            russh_sftp::server::run(channel.into_stream(), sftp).await;
        } else {
            session.channel_failure(channel_id)?;
        }

        Ok(())
    }
}
