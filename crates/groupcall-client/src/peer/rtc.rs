//! webrtc-rs implementation of the peer-connection collaborator

use super::connector::{PeerConnector, PeerDirection, PeerHandle, PeerOffer};
use crate::config::{ClientConfig, MediaConstraints};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::api::{APIBuilder, API};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;

/// Upper bound on waiting for ICE candidates before the offer is sent anyway
const GATHERING_TIMEOUT: Duration = Duration::from_secs(5);

/// Peer connector backed by webrtc-rs
///
/// Offers carry all gathered candidates (no trickle ICE), matching what the
/// group-call server expects from `receiveVideoFrom`.
pub struct RtcPeerConnector {
    api: API,
    rtc_config: RTCConfiguration,
    connections: RwLock<HashMap<Uuid, Arc<RTCPeerConnection>>>,
}

impl RtcPeerConnector {
    /// Create a connector using the ICE servers from `config`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| Error::PeerConnectionError(format!("Failed to register codecs: {}", e)))?;

        let interceptor_registry =
            register_default_interceptors(Default::default(), &mut media_engine).map_err(|e| {
                Error::PeerConnectionError(format!("Failed to register interceptors: {}", e))
            })?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(interceptor_registry)
            .build();

        let ice_servers: Vec<RTCIceServer> = config
            .stun_servers
            .iter()
            .map(|url| RTCIceServer {
                urls: vec![url.clone()],
                ..Default::default()
            })
            .chain(config.turn_servers.iter().map(|turn| RTCIceServer {
                urls: vec![turn.url.clone()],
                username: turn.username.clone(),
                credential: turn.credential.clone(),
                ..Default::default()
            }))
            .collect();

        Ok(Self {
            api,
            rtc_config: RTCConfiguration {
                ice_servers,
                ..Default::default()
            },
            connections: RwLock::new(HashMap::new()),
        })
    }

    /// Number of connections currently held open
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    async fn new_connection(&self) -> Result<Arc<RTCPeerConnection>> {
        let pc = self
            .api
            .new_peer_connection(self.rtc_config.clone())
            .await
            .map_err(|e| {
                Error::PeerConnectionError(format!("Failed to create peer connection: {}", e))
            })?;
        Ok(Arc::new(pc))
    }

    /// Create the local offer and wait for candidate gathering
    async fn local_offer(pc: &RTCPeerConnection) -> Result<String> {
        let offer = pc
            .create_offer(None)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to create offer: {}", e)))?;

        let mut gathering_done = pc.gathering_complete_promise().await;

        pc.set_local_description(offer)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set local description: {}", e)))?;

        if tokio::time::timeout(GATHERING_TIMEOUT, gathering_done.recv())
            .await
            .is_err()
        {
            warn!("ICE gathering did not finish in {:?}, sending partial offer", GATHERING_TIMEOUT);
        }

        let local = pc
            .local_description()
            .await
            .ok_or_else(|| Error::SdpError("No local description after setting offer".to_string()))?;

        Ok(local.sdp)
    }

    async fn register(
        &self,
        pc: Arc<RTCPeerConnection>,
        direction: PeerDirection,
        sdp: String,
    ) -> PeerOffer {
        let handle = PeerHandle::new(direction);
        self.connections.write().await.insert(handle.id(), pc);
        debug!(handle = %handle, "Peer connection registered");
        PeerOffer { sdp, handle }
    }

    /// VP8 capability bounded by the requested frame rate and size
    fn video_capability(constraints: &MediaConstraints) -> RTCRtpCodecCapability {
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_string(),
            clock_rate: 90000,
            channels: 0,
            sdp_fmtp_line: format!(
                "max-fr={};max-fs={}",
                constraints.video.max_frame_rate,
                constraints.video.max_frame_size_macroblocks()
            ),
            rtcp_feedback: vec![],
        }
    }

    fn audio_capability() -> RTCRtpCodecCapability {
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_string(),
            clock_rate: 48000,
            channels: 2,
            sdp_fmtp_line: "minptime=10;useinbandfec=1".to_string(),
            rtcp_feedback: vec![],
        }
    }

    async fn add_send_track(
        pc: &RTCPeerConnection,
        capability: RTCRtpCodecCapability,
        kind: &str,
        stream_id: &str,
    ) -> Result<()> {
        let track = Arc::new(TrackLocalStaticSample::new(
            capability,
            kind.to_string(),
            stream_id.to_string(),
        ));

        pc.add_transceiver_from_track(
            track as Arc<dyn TrackLocal + Send + Sync>,
            Some(RTCRtpTransceiverInit {
                direction: RTCRtpTransceiverDirection::Sendonly,
                send_encodings: vec![],
            }),
        )
        .await
        .map_err(|e| Error::PeerConnectionError(format!("Failed to add {} track: {}", kind, e)))?;

        Ok(())
    }

    async fn add_receive_transceiver(pc: &RTCPeerConnection, kind: RTPCodecType) -> Result<()> {
        pc.add_transceiver_from_kind(
            kind,
            Some(RTCRtpTransceiverInit {
                direction: RTCRtpTransceiverDirection::Recvonly,
                send_encodings: vec![],
            }),
        )
        .await
        .map_err(|e| {
            Error::PeerConnectionError(format!("Failed to add {:?} transceiver: {}", kind, e))
        })?;

        Ok(())
    }

    async fn close_quietly(pc: &RTCPeerConnection) {
        if let Err(e) = pc.close().await {
            warn!("Error closing peer connection: {}", e);
        }
    }
}

#[async_trait]
impl PeerConnector for RtcPeerConnector {
    async fn create_send_only(&self, constraints: &MediaConstraints) -> Result<PeerOffer> {
        let pc = self.new_connection().await?;
        let stream_id = format!("groupcall-{}", Uuid::new_v4());

        let setup = async {
            Self::add_send_track(&pc, Self::video_capability(constraints), "video", &stream_id)
                .await?;
            if constraints.audio {
                Self::add_send_track(&pc, Self::audio_capability(), "audio", &stream_id).await?;
            }
            Self::local_offer(&pc).await
        };

        match setup.await {
            Ok(sdp) => {
                info!("Send-only offer created");
                Ok(self.register(pc, PeerDirection::SendOnly, sdp).await)
            }
            Err(e) => {
                Self::close_quietly(&pc).await;
                Err(e)
            }
        }
    }

    async fn create_receive_only(&self, constraints: &MediaConstraints) -> Result<PeerOffer> {
        let pc = self.new_connection().await?;

        let setup = async {
            Self::add_receive_transceiver(&pc, RTPCodecType::Video).await?;
            if constraints.audio {
                Self::add_receive_transceiver(&pc, RTPCodecType::Audio).await?;
            }
            Self::local_offer(&pc).await
        };

        match setup.await {
            Ok(sdp) => {
                info!("Receive-only offer created");
                Ok(self.register(pc, PeerDirection::ReceiveOnly, sdp).await)
            }
            Err(e) => {
                Self::close_quietly(&pc).await;
                Err(e)
            }
        }
    }

    async fn apply_remote_answer(&self, handle: &PeerHandle, sdp_answer: &str) -> Result<()> {
        let pc = self
            .connections
            .read()
            .await
            .get(&handle.id())
            .cloned()
            .ok_or_else(|| Error::PeerConnectionError(format!("No connection for {}", handle)))?;

        let answer = RTCSessionDescription::answer(sdp_answer.to_string())
            .map_err(|e| Error::SdpError(format!("Failed to parse answer: {}", e)))?;

        pc.set_remote_description(answer)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set remote description: {}", e)))?;

        debug!(handle = %handle, "Remote answer applied");
        Ok(())
    }

    async fn dispose(&self, handle: PeerHandle) {
        let removed = self.connections.write().await.remove(&handle.id());
        match removed {
            Some(pc) => {
                Self::close_quietly(&pc).await;
                debug!(handle = %handle, "Peer connection disposed");
            }
            None => warn!(handle = %handle, "Dispose requested for unknown peer connection"),
        }
    }
}
