//! FTP implementation of [`RemoteStore`] on top of `suppaftp`.

use super::{Connect, RemoteStore};
use crate::config::FtpConfig;
use crate::utils::errors::{BackupError, Result};
use std::io::{self, Write};
use std::net::ToSocketAddrs;
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use tracing::debug;

/// Connection parameters for opening FTP sessions.
#[derive(Debug, Clone)]
pub struct FtpConnector {
    host: String,
    port: u16,
    username: String,
    password: String,
    timeout: Duration,
}

impl FtpConnector {
    pub fn new(config: &FtpConfig, timeout: Duration) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            timeout,
        }
    }
}

impl Connect for FtpConnector {
    type Store = FtpSession;

    fn connect(&self) -> Result<FtpSession> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                BackupError::Config(format!("could not resolve FTP host {}", self.host))
            })?;

        let mut stream = FtpStream::connect_timeout(addr, self.timeout)?;
        stream.get_ref().set_read_timeout(Some(self.timeout))?;
        stream.get_ref().set_write_timeout(Some(self.timeout))?;
        stream.login(&self.username, &self.password)?;
        stream.transfer_type(FileType::Binary)?;

        debug!("Connected to ftp://{}@{}:{}", self.username, self.host, self.port);
        Ok(FtpSession { stream })
    }
}

/// One logged-in FTP control connection.
pub struct FtpSession {
    stream: FtpStream,
}

impl RemoteStore for FtpSession {
    fn list_directory(&mut self, path: &str) -> Result<Vec<String>> {
        let path = if path.is_empty() { None } else { Some(path) };
        Ok(self.stream.list(path)?)
    }

    fn retrieve_file(&mut self, path: &str, dest: &mut dyn Write) -> Result<u64> {
        let written = self.stream.retr(path, |reader| {
            io::copy(reader, &mut *dest).map_err(FtpError::ConnectionError)
        })?;
        Ok(written)
    }

    fn change_directory(&mut self, path: &str) -> Result<()> {
        Ok(self.stream.cwd(path)?)
    }

    fn delete_file(&mut self, path: &str) -> Result<()> {
        Ok(self.stream.rm(path)?)
    }

    fn remove_directory(&mut self, path: &str) -> Result<()> {
        Ok(self.stream.rmdir(path)?)
    }

    fn quit(&mut self) -> Result<()> {
        Ok(self.stream.quit()?)
    }
}
