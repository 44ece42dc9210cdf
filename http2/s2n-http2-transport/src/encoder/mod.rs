// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The outbound-side bookkeeping the decoder collaborates with
//!
//! Only the surface the decoder consumes is implemented here: the FIFO of
//! locally-sent SETTINGS awaiting acknowledgement, application of remote
//! SETTINGS to the outbound side, outbound flow-control credit, and a
//! staged frame writer. Frames are staged by the handlers and flushed in
//! dispatch order, so a SETTINGS acknowledgement always precedes writes
//! issued from within the listener.

use crate::connection::Connection;
use s2n_codec::EncoderValue;
use s2n_http2_core::{
    connection_error,
    error::Error,
    frame::{Ping, SettingsFrame, WindowUpdate},
    settings::{Settings, DEFAULT_INITIAL_WINDOW_SIZE, MAX_WINDOW_SIZE},
    stream::StreamId,
    stream_error,
};
use std::collections::VecDeque;

#[derive(Debug)]
pub struct ConnectionEncoder {
    pending_settings: VecDeque<Settings>,
    staged: Vec<u8>,
    flushed: Vec<u8>,
    connection_send_window: i64,
}

impl Default for ConnectionEncoder {
    fn default() -> Self {
        Self {
            pending_settings: VecDeque::new(),
            staged: Vec::new(),
            flushed: Vec::new(),
            connection_send_window: i64::from(DEFAULT_INITIAL_WINDOW_SIZE),
        }
    }
}

impl ConnectionEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage<F: EncoderValue>(&mut self, frame: &F) {
        self.staged.extend_from_slice(&frame.encode_to_vec());
    }

    /// Writes a SETTINGS frame and queues it for acknowledgement.
    ///
    /// The parameters take effect on the inbound side only when the peer
    /// acknowledges them.
    pub fn write_settings(&mut self, settings: Settings) {
        self.stage(&SettingsFrame::new(settings));
        self.pending_settings.push_back(settings);
    }

    /// Pops the oldest SETTINGS payload awaiting acknowledgement
    pub fn poll_sent_settings(&mut self) -> Option<Settings> {
        self.pending_settings.pop_front()
    }

    /// The number of SETTINGS payloads awaiting acknowledgement
    pub fn pending_settings_len(&self) -> usize {
        self.pending_settings.len()
    }

    /// Stages an acknowledgement for a received SETTINGS frame
    pub fn write_settings_ack(&mut self) {
        self.stage(&SettingsFrame::ack());
    }

    /// Stages an acknowledgement for a received PING, echoing its payload
    pub fn write_ping_ack(&mut self, data: [u8; 8]) {
        self.stage(&Ping { ack: true, data });
    }

    /// Stages a WINDOW_UPDATE frame
    pub fn write_window_update(&mut self, window_update: WindowUpdate) {
        self.stage(&window_update);
    }

    /// Moves staged frames to the wire buffer
    pub fn flush(&mut self) {
        self.flushed.append(&mut self.staged);
    }

    /// Takes everything flushed so far, in write order
    pub fn take_flushed(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.flushed)
    }

    /// Applies a peer's SETTINGS frame to the outbound side.
    ///
    /// Unlike locally-sent settings, remote settings are installed
    /// immediately: they constrain what this endpoint may send.
    pub fn remote_settings(
        &mut self,
        connection: &mut Connection,
        settings: &Settings,
    ) -> Result<(), Error> {
        if let Some(size) = settings.header_table_size() {
            connection.remote_mut().set_header_table_size(size);
        }

        if let Some(enabled) = settings.enable_push() {
            connection.remote_mut().set_allow_push(enabled);
        }

        if let Some(max) = settings.max_concurrent_streams() {
            // the peer bounds the streams this endpoint may open
            connection.local_mut().set_max_active_streams(max);
        }

        if let Some(size) = settings.max_frame_size() {
            connection.remote_mut().set_max_frame_size(size);
        }

        if let Some(size) = settings.max_header_list_size() {
            connection.remote_mut().set_max_header_list_size(size);
        }

        if let Some(size) = settings.initial_window_size() {
            let old = connection.remote().initial_window_size();
            let delta = i64::from(size) - i64::from(old);
            connection.remote_mut().set_initial_window_size(size);

            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.9.2
            //# In addition to changing the flow-control window for streams
            //# that are not yet active, a SETTINGS frame can alter the
            //# initial flow-control window size for streams with active
            //# flow-control windows (that is, streams in the "open" or
            //# "half-closed (remote)" state).
            for stream in connection.streams_mut() {
                let window = stream.send_window() + delta;
                if window > i64::from(MAX_WINDOW_SIZE) {
                    return Err(connection_error!(
                        FLOW_CONTROL_ERROR,
                        "initial window size change overflows a stream window"
                    )
                    .into());
                }
                stream.set_send_window(window);
            }
        }

        Ok(())
    }

    /// Applies a received WINDOW_UPDATE to the outbound flow-control
    /// credit
    pub fn window_update_received(
        &mut self,
        connection: &mut Connection,
        stream_id: StreamId,
        increment: u32,
    ) -> Result<(), Error> {
        if stream_id.is_connection_control() {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.9
            //# A receiver MUST treat the receipt of a WINDOW_UPDATE frame
            //# with a flow-control window increment of 0 as a stream error
            //# (Section 5.4.2) of type PROTOCOL_ERROR; errors on the
            //# connection flow-control window MUST be treated as a
            //# connection error (Section 5.4.1).
            if increment == 0 {
                return Err(connection_error!(
                    PROTOCOL_ERROR,
                    "WINDOW_UPDATE with a zero increment on the connection"
                )
                .into());
            }

            let window = self.connection_send_window + i64::from(increment);
            if window > i64::from(MAX_WINDOW_SIZE) {
                return Err(connection_error!(
                    FLOW_CONTROL_ERROR,
                    "connection flow-control window overflow"
                )
                .into());
            }
            self.connection_send_window = window;
            return Ok(());
        }

        if increment == 0 {
            return Err(stream_error!(
                stream_id,
                PROTOCOL_ERROR,
                "WINDOW_UPDATE with a zero increment"
            )
            .into());
        }

        if let Some(stream) = connection.stream_mut(stream_id) {
            let window = stream.send_window() + i64::from(increment);
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.9.1
            //# If a sender receives a WINDOW_UPDATE that causes a flow-
            //# control window to exceed this maximum, it MUST terminate
            //# either the stream or the connection, as appropriate.
            if window > i64::from(MAX_WINDOW_SIZE) {
                return Err(stream_error!(
                    stream_id,
                    FLOW_CONTROL_ERROR,
                    "stream flow-control window overflow"
                )
                .into());
            }
            stream.set_send_window(window);
        }

        Ok(())
    }

    /// The credit this endpoint may spend on the connection
    pub fn connection_send_window(&self) -> i64 {
        self.connection_send_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s2n_http2_core::endpoint;

    #[test]
    fn settings_fifo_order() {
        let mut encoder = ConnectionEncoder::new();
        let first = Settings::EMPTY.with_max_concurrent_streams(10);
        let second = Settings::EMPTY.with_enable_push(false);

        encoder.write_settings(first);
        encoder.write_settings(second);
        assert_eq!(encoder.pending_settings_len(), 2);

        assert_eq!(encoder.poll_sent_settings(), Some(first));
        assert_eq!(encoder.poll_sent_settings(), Some(second));
        assert_eq!(encoder.poll_sent_settings(), None);
    }

    #[test]
    fn staged_frames_flush_in_order() {
        let mut encoder = ConnectionEncoder::new();
        encoder.write_settings_ack();
        assert!(encoder.take_flushed().is_empty());

        encoder.flush();
        let bytes = encoder.take_flushed();
        // SETTINGS frame header with the ACK flag
        assert_eq!(&bytes[..5], &[0, 0, 0, 0x4, 0x1]);
    }

    #[test]
    fn remote_initial_window_size_adjusts_send_windows() {
        let mut connection = Connection::new(endpoint::Type::Server);
        let stream_id = StreamId::new(1).unwrap();
        connection.create_remote_stream(stream_id).unwrap();

        let mut encoder = ConnectionEncoder::new();
        encoder
            .remote_settings(
                &mut connection,
                &Settings::EMPTY.with_initial_window_size(DEFAULT_INITIAL_WINDOW_SIZE + 1000),
            )
            .unwrap();

        assert_eq!(
            connection.stream(stream_id).unwrap().send_window(),
            i64::from(DEFAULT_INITIAL_WINDOW_SIZE) + 1000
        );
        assert_eq!(
            connection.remote().initial_window_size(),
            DEFAULT_INITIAL_WINDOW_SIZE + 1000
        );
    }

    #[test]
    fn window_update_zero_increment() {
        let mut connection = Connection::new(endpoint::Type::Server);
        let stream_id = StreamId::new(1).unwrap();
        connection.create_remote_stream(stream_id).unwrap();
        let mut encoder = ConnectionEncoder::new();

        let error = encoder
            .window_update_received(&mut connection, StreamId::CONNECTION, 0)
            .unwrap_err();
        assert!(error.is_connection_error());

        let error = encoder
            .window_update_received(&mut connection, stream_id, 0)
            .unwrap_err();
        assert_eq!(error.stream_id(), Some(stream_id));
    }

    #[test]
    fn window_update_overflow() {
        let mut connection = Connection::new(endpoint::Type::Server);
        let stream_id = StreamId::new(1).unwrap();
        connection.create_remote_stream(stream_id).unwrap();
        let mut encoder = ConnectionEncoder::new();

        let error = encoder
            .window_update_received(&mut connection, stream_id, MAX_WINDOW_SIZE)
            .unwrap_err();
        assert_eq!(
            error.code(),
            s2n_http2_core::error::ErrorCode::FLOW_CONTROL_ERROR
        );

        encoder
            .window_update_received(&mut connection, StreamId::CONNECTION, 1000)
            .unwrap();
        assert_eq!(
            encoder.connection_send_window(),
            i64::from(DEFAULT_INITIAL_WINDOW_SIZE) + 1000
        );
    }
}
