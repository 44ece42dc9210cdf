// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Stream lifecycle coupling
//!
//! The decoder never closes streams directly; it asks the lifecycle
//! manager to transition them so that implementations can hook teardown
//! (releasing response handlers, pruning the registry) in one place.

use crate::connection::Connection;
use s2n_http2_core::{error::Error, stream::StreamId};

pub trait StreamLifecycle {
    /// Transitions a stream after the remote side finished sending.
    ///
    /// Called for END_STREAM on DATA and HEADERS frames.
    fn close_remote_side(
        &mut self,
        connection: &mut Connection,
        stream_id: StreamId,
    ) -> Result<(), Error>;

    /// Fully closes a stream, both sides.
    ///
    /// Called for RST_STREAM.
    fn close_stream(
        &mut self,
        connection: &mut Connection,
        stream_id: StreamId,
    ) -> Result<(), Error>;
}

/// Drives the stream state machine and nothing else.
///
/// Closed streams stay in the registry; pruning is the owning
/// connection's concern.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultStreamLifecycle;

impl StreamLifecycle for DefaultStreamLifecycle {
    fn close_remote_side(
        &mut self,
        connection: &mut Connection,
        stream_id: StreamId,
    ) -> Result<(), Error> {
        if let Some(stream) = connection.stream_mut(stream_id) {
            stream.close_remote_side();
        }
        Ok(())
    }

    fn close_stream(
        &mut self,
        connection: &mut Connection,
        stream_id: StreamId,
    ) -> Result<(), Error> {
        if let Some(stream) = connection.stream_mut(stream_id) {
            stream.close();
        }
        Ok(())
    }
}
