// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The application-facing listener invoked for every accepted frame

use crate::stream::Stream;
use s2n_http2_core::{
    error::{Error, ErrorCode},
    frame::Priority,
    settings::Settings,
    stream::StreamId,
};

/// Receives well-typed events for every frame the decoder accepts.
///
/// All methods default to no-ops so implementations only handle the
/// events they care about. Any returned error aborts the dispatch of the
/// current frame and surfaces from `decode_frame`; only the DATA path
/// inspects listener failures (to rebalance flow control) before
/// re-raising them.
pub trait FrameReadListener {
    /// Handles DATA delivered on an open stream.
    ///
    /// Returns the number of octets the application has fully processed;
    /// those are immediately returned to the flow-control window. Octets
    /// the application wants to hold on to should be marked via
    /// [`RecvFlow::mark_unconsumed`](crate::stream::RecvFlow::mark_unconsumed)
    /// on the stream and consumed later.
    fn on_data_read(
        &mut self,
        stream: &mut Stream,
        data: &[u8],
        padding: usize,
        end_of_stream: bool,
    ) -> Result<usize, Error> {
        let _ = (stream, end_of_stream);
        Ok(data.len() + padding)
    }

    /// Handles a complete field block for a stream
    fn on_headers_read(
        &mut self,
        stream: &mut Stream,
        block: &[u8],
        priority: Priority,
        padding: usize,
        end_of_stream: bool,
    ) -> Result<(), Error> {
        let _ = (stream, block, priority, padding, end_of_stream);
        Ok(())
    }

    fn on_priority_read(&mut self, stream_id: StreamId, priority: Priority) -> Result<(), Error> {
        let _ = (stream_id, priority);
        Ok(())
    }

    fn on_rst_stream_read(
        &mut self,
        stream_id: StreamId,
        error_code: ErrorCode,
    ) -> Result<(), Error> {
        let _ = (stream_id, error_code);
        Ok(())
    }

    fn on_settings_read(&mut self, settings: &Settings) -> Result<(), Error> {
        let _ = settings;
        Ok(())
    }

    fn on_settings_ack_read(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn on_ping_read(&mut self, data: [u8; 8]) -> Result<(), Error> {
        let _ = data;
        Ok(())
    }

    fn on_ping_ack_read(&mut self, data: [u8; 8]) -> Result<(), Error> {
        let _ = data;
        Ok(())
    }

    /// Handles a promise for a server-initiated stream.
    ///
    /// The promised stream has already been reserved when this is invoked.
    fn on_push_promise_read(
        &mut self,
        stream_id: StreamId,
        promised_stream_id: StreamId,
        block: &[u8],
        padding: usize,
    ) -> Result<(), Error> {
        let _ = (stream_id, promised_stream_id, block, padding);
        Ok(())
    }

    fn on_go_away_read(
        &mut self,
        last_stream_id: StreamId,
        error_code: ErrorCode,
        debug_data: &[u8],
    ) -> Result<(), Error> {
        let _ = (last_stream_id, error_code, debug_data);
        Ok(())
    }

    fn on_window_update_read(
        &mut self,
        stream_id: StreamId,
        window_size_increment: u32,
    ) -> Result<(), Error> {
        let _ = (stream_id, window_size_increment);
        Ok(())
    }

    /// Handles a frame of an unknown type.
    ///
    /// Unknown frames are never an error at the protocol layer, but the
    /// listener may inspect them for extensions.
    fn on_unknown_frame(
        &mut self,
        frame_type: u8,
        stream_id: StreamId,
        flags: u8,
        payload: &[u8],
    ) -> Result<(), Error> {
        let _ = (frame_type, stream_id, flags, payload);
        Ok(())
    }
}
