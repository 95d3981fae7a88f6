//! Bluetooth Classic RFCOMM listener (BlueZ via bluer).
//!
//! Registers a Serial Port Profile record named `robot-spider` with
//! bluetoothd; BlueZ then hands us one RFCOMM stream per incoming
//! connection.  Dropping the profile handle withdraws the record.
//!
//! Linux only, behind the `bluetooth` feature.

use async_trait::async_trait;
use bluer::rfcomm::{Profile, ProfileHandle, Role, Stream};
use futures_util::StreamExt;
use tracing::info;

use spider_core::domain::advertisement::SPP_UUID;

use crate::application::transport::{Accepted, CommandListener, TransportError};
use crate::infrastructure::stream_transport::StreamConnection;

fn bt_error(e: impl std::fmt::Display) -> TransportError {
    TransportError::Bluetooth(e.to_string())
}

/// Serial Port Profile listener.
pub struct RfcommListener {
    // Keeps the D-Bus connection alive for as long as the profile is registered.
    _session: bluer::Session,
    profile: Option<ProfileHandle>,
    adapter_address: String,
}

impl RfcommListener {
    /// Powers the default adapter on and registers the SPP record as `name`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Bluetooth`] if bluetoothd is unreachable, there is no
    /// adapter, or the profile is rejected.
    pub async fn register(name: &str) -> Result<Self, TransportError> {
        let session = bluer::Session::new().await.map_err(bt_error)?;
        let adapter = session.default_adapter().await.map_err(bt_error)?;
        adapter.set_powered(true).await.map_err(bt_error)?;
        let adapter_address = adapter.address().await.map_err(bt_error)?.to_string();

        let profile = Profile {
            uuid: bluer::Uuid::parse_str(SPP_UUID).map_err(bt_error)?,
            name: Some(name.to_string()),
            role: Some(Role::Server),
            require_authentication: Some(false),
            require_authorization: Some(false),
            ..Default::default()
        };
        let handle = session.register_profile(profile).await.map_err(bt_error)?;

        info!(
            "Serial Port Profile '{name}' registered on adapter {} ({adapter_address})",
            adapter.name()
        );

        Ok(Self {
            _session: session,
            profile: Some(handle),
            adapter_address,
        })
    }

    /// Bluetooth address of the adapter the profile lives on.
    pub fn adapter_address(&self) -> &str {
        &self.adapter_address
    }
}

#[async_trait]
impl CommandListener for RfcommListener {
    type Connection = StreamConnection<Stream>;

    async fn accept(&mut self) -> Result<Accepted<Self::Connection>, TransportError> {
        let profile = self.profile.as_mut().ok_or(TransportError::ListenerClosed)?;
        let request = profile.next().await.ok_or(TransportError::ListenerClosed)?;
        let peer = request.device().to_string();
        let stream = request.accept().map_err(bt_error)?;
        Ok(Accepted {
            connection: StreamConnection::new(stream),
            peer,
        })
    }

    async fn close(&mut self) {
        if self.profile.take().is_some() {
            info!("Serial Port Profile unregistered");
        }
    }
}
