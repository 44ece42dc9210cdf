// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Inbound flow control
//!
//! The dispatch core calls `receive_flow_controlled_frame` for every DATA
//! frame before anything else can fail, and `consume_bytes` for every
//! octet the application reports as processed. Regenerated window quota
//! is queued as WINDOW_UPDATE frames; the decoder drains the queue into
//! the encoder after each dispatch.

use crate::connection::Connection;
use s2n_http2_core::{
    connection_error,
    error::Error,
    frame::WindowUpdate,
    settings::DEFAULT_INITIAL_WINDOW_SIZE,
    stream::StreamId,
    stream_error,
};

pub trait InboundFlowController {
    /// Charges a flow-controlled frame against the connection and stream
    /// windows.
    ///
    /// This is the sole point where the inbound windows decrease. It runs
    /// exactly once per DATA frame, even for frames that are ignored or
    /// rejected later in the dispatch.
    fn receive_flow_controlled_frame(
        &mut self,
        connection: &mut Connection,
        stream_id: StreamId,
        data_len: usize,
        padding: usize,
        end_of_stream: bool,
    ) -> Result<(), Error>;

    /// Octets received on the stream that the application has not yet
    /// reported as processed
    fn unconsumed_bytes(&self, connection: &Connection, stream_id: StreamId) -> u64;

    /// Returns processed octets to the stream and connection windows,
    /// potentially queueing WINDOW_UPDATE frames
    fn consume_bytes(
        &mut self,
        connection: &mut Connection,
        stream_id: StreamId,
        bytes: usize,
    ) -> Result<(), Error>;

    /// Changes the initial window for new streams and retroactively
    /// adjusts existing streams by the delta
    fn initial_window_size(&mut self, connection: &mut Connection, size: u32)
        -> Result<(), Error>;

    /// Drains the WINDOW_UPDATE frames queued by `consume_bytes`
    fn take_pending_window_updates(&mut self) -> Vec<WindowUpdate>;
}

/// The default inbound flow controller.
///
/// Window regeneration follows the half-window discipline: once the
/// processed window falls to `ratio * initial` or below, a WINDOW_UPDATE
/// restoring the full initial window is queued.
#[derive(Debug)]
pub struct DefaultInboundFlowController {
    connection_flow: crate::stream::RecvFlow,
    connection_window_target: u32,
    window_update_ratio: f64,
    pending_window_updates: Vec<WindowUpdate>,
}

impl Default for DefaultInboundFlowController {
    fn default() -> Self {
        Self {
            connection_flow: crate::stream::RecvFlow::new(DEFAULT_INITIAL_WINDOW_SIZE),
            connection_window_target: DEFAULT_INITIAL_WINDOW_SIZE,
            window_update_ratio: 0.5,
            pending_window_updates: Vec::new(),
        }
    }
}

impl DefaultInboundFlowController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the ratio of the window that may be outstanding before a
    /// WINDOW_UPDATE is queued
    pub fn with_window_update_ratio(mut self, ratio: f64) -> Self {
        self.window_update_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// The connection-level receive window
    pub fn connection_flow(&self) -> &crate::stream::RecvFlow {
        &self.connection_flow
    }

    fn threshold(&self, target: u32) -> i64 {
        (f64::from(target) * self.window_update_ratio) as i64
    }
}

impl InboundFlowController for DefaultInboundFlowController {
    fn receive_flow_controlled_frame(
        &mut self,
        connection: &mut Connection,
        stream_id: StreamId,
        data_len: usize,
        padding: usize,
        end_of_stream: bool,
    ) -> Result<(), Error> {
        let _ = end_of_stream;
        let total = data_len + padding;

        //= https://www.rfc-editor.org/rfc/rfc9113#section-6.9.1
        //# The sender MUST NOT send a flow-controlled frame with a length
        //# that exceeds the space available in either of the flow-control
        //# windows advertised by the receiver.
        if self.connection_flow.receive(total).is_err() {
            return Err(connection_error!(
                FLOW_CONTROL_ERROR,
                "exceeded the connection flow-control window"
            )
            .into());
        }

        if let Some(stream) = connection.stream_mut(stream_id) {
            if stream.recv_flow_mut().receive(total).is_err() {
                return Err(stream_error!(
                    stream_id,
                    FLOW_CONTROL_ERROR,
                    "exceeded the stream flow-control window"
                )
                .into());
            }
        }

        Ok(())
    }

    fn unconsumed_bytes(&self, connection: &Connection, stream_id: StreamId) -> u64 {
        connection
            .stream(stream_id)
            .map(|stream| stream.recv_flow().unconsumed_bytes())
            .unwrap_or(0)
    }

    fn consume_bytes(
        &mut self,
        connection: &mut Connection,
        stream_id: StreamId,
        bytes: usize,
    ) -> Result<(), Error> {
        if self.connection_flow.consume(bytes).is_err() {
            return Err(connection_error!(
                INTERNAL_ERROR,
                "returned more bytes than were received on the connection"
            )
            .into());
        }

        let connection_target = self.connection_window_target;
        let connection_threshold = self.threshold(connection_target);
        if let Some(increment) = self
            .connection_flow
            .release_quota(connection_target, connection_threshold)
        {
            self.pending_window_updates.push(WindowUpdate {
                stream_id: StreamId::CONNECTION,
                window_size_increment: increment,
            });
        }

        let stream_target = connection.local().initial_window_size();
        let stream_threshold = self.threshold(stream_target);
        if let Some(stream) = connection.stream_mut(stream_id) {
            if stream.recv_flow_mut().consume(bytes).is_err() {
                return Err(connection_error!(
                    INTERNAL_ERROR,
                    "returned more bytes than were received on the stream"
                )
                .into());
            }

            // no update for a stream the peer can no longer send on
            if !stream.state().is_closed() {
                if let Some(increment) = stream
                    .recv_flow_mut()
                    .release_quota(stream_target, stream_threshold)
                {
                    self.pending_window_updates.push(WindowUpdate {
                        stream_id,
                        window_size_increment: increment,
                    });
                }
            }
        }

        Ok(())
    }

    fn initial_window_size(
        &mut self,
        connection: &mut Connection,
        size: u32,
    ) -> Result<(), Error> {
        let old = connection.local().initial_window_size();
        let delta = i64::from(size) - i64::from(old);
        connection.local_mut().set_initial_window_size(size);

        //= https://www.rfc-editor.org/rfc/rfc9113#section-6.9.2
        //# When the value of SETTINGS_INITIAL_WINDOW_SIZE changes, a
        //# receiver MUST adjust the size of all stream flow-control windows
        //# that it maintains by the difference between the new value and
        //# the old value.
        for stream in connection.streams_mut() {
            if stream.recv_flow_mut().adjust(delta).is_err() {
                return Err(connection_error!(
                    FLOW_CONTROL_ERROR,
                    "initial window size change overflows a stream window"
                )
                .into());
            }
        }

        Ok(())
    }

    fn take_pending_window_updates(&mut self) -> Vec<WindowUpdate> {
        core::mem::take(&mut self.pending_window_updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s2n_http2_core::endpoint;

    fn connection_with_stream(id: u32) -> (Connection, StreamId) {
        let mut connection = Connection::new(endpoint::Type::Server);
        let stream_id = StreamId::new(id).unwrap();
        connection
            .create_remote_stream(stream_id)
            .unwrap()
            .open(false)
            .unwrap();
        (connection, stream_id)
    }

    #[test]
    fn receive_and_consume_round_trip() {
        let (mut connection, stream_id) = connection_with_stream(1);
        let mut controller = DefaultInboundFlowController::new();

        controller
            .receive_flow_controlled_frame(&mut connection, stream_id, 100, 0, false)
            .unwrap();
        assert_eq!(
            connection.stream(stream_id).unwrap().recv_flow().window(),
            i64::from(DEFAULT_INITIAL_WINDOW_SIZE) - 100
        );

        controller
            .consume_bytes(&mut connection, stream_id, 100)
            .unwrap();
        // far from the threshold: no WINDOW_UPDATE yet
        assert!(controller.take_pending_window_updates().is_empty());
    }

    #[test]
    fn window_updates_are_queued_at_the_threshold() {
        let (mut connection, stream_id) = connection_with_stream(1);
        let mut controller = DefaultInboundFlowController::new();

        let spend = DEFAULT_INITIAL_WINDOW_SIZE as usize / 2 + 1;
        controller
            .receive_flow_controlled_frame(&mut connection, stream_id, spend, 0, false)
            .unwrap();
        controller
            .consume_bytes(&mut connection, stream_id, spend)
            .unwrap();

        let updates = controller.take_pending_window_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].stream_id, StreamId::CONNECTION);
        assert_eq!(updates[0].window_size_increment, spend as u32);
        assert_eq!(updates[1].stream_id, stream_id);
        assert_eq!(updates[1].window_size_increment, spend as u32);

        // the queue drains
        assert!(controller.take_pending_window_updates().is_empty());
    }

    #[test]
    fn connection_window_is_enforced() {
        let (mut connection, stream_id) = connection_with_stream(1);
        let mut controller = DefaultInboundFlowController::new();

        let error = controller
            .receive_flow_controlled_frame(
                &mut connection,
                stream_id,
                DEFAULT_INITIAL_WINDOW_SIZE as usize + 1,
                0,
                false,
            )
            .unwrap_err();
        assert!(error.is_connection_error());
    }

    #[test]
    fn stream_window_is_enforced() {
        let (mut connection, stream_id) = connection_with_stream(1);
        connection
            .stream_mut(stream_id)
            .unwrap()
            .recv_flow_mut()
            .adjust(-1)
            .unwrap();
        let mut controller = DefaultInboundFlowController::new();

        let error = controller
            .receive_flow_controlled_frame(
                &mut connection,
                stream_id,
                DEFAULT_INITIAL_WINDOW_SIZE as usize,
                0,
                false,
            )
            .unwrap_err();
        assert_eq!(error.stream_id(), Some(stream_id));
    }

    #[test]
    fn initial_window_size_adjusts_existing_streams() {
        let (mut connection, stream_id) = connection_with_stream(1);
        let mut controller = DefaultInboundFlowController::new();

        controller
            .initial_window_size(&mut connection, DEFAULT_INITIAL_WINDOW_SIZE - 1000)
            .unwrap();
        assert_eq!(
            connection.stream(stream_id).unwrap().recv_flow().window(),
            i64::from(DEFAULT_INITIAL_WINDOW_SIZE) - 1000
        );
        assert_eq!(
            connection.local().initial_window_size(),
            DEFAULT_INITIAL_WINDOW_SIZE - 1000
        );

        // the connection window is not affected
        assert_eq!(
            controller.connection_flow().window(),
            i64::from(DEFAULT_INITIAL_WINDOW_SIZE)
        );
    }
}
