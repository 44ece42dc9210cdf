// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The connection model: two endpoint halves and the stream registry

use crate::stream::Stream;
use hashbrown::HashMap;
use s2n_http2_core::{
    connection_error,
    endpoint,
    error::{ConnectionError, Error},
    settings,
    stream::StreamId,
    stream_error,
};

/// Per-endpoint configuration and bookkeeping.
///
/// The local half describes this endpoint's inbound expectations; the
/// remote half mirrors what the peer has advertised (or what this
/// endpoint's acknowledged SETTINGS imposed on the peer).
#[derive(Clone, Debug)]
pub struct Endpoint {
    endpoint_type: endpoint::Type,
    initial_window_size: u32,
    max_active_streams: u32,
    header_table_size: u32,
    max_frame_size: u32,
    max_header_list_size: Option<u32>,
    allow_push: bool,
    last_stream_created: Option<StreamId>,
}

impl Endpoint {
    fn new(endpoint_type: endpoint::Type) -> Self {
        Self {
            endpoint_type,
            initial_window_size: settings::DEFAULT_INITIAL_WINDOW_SIZE,
            max_active_streams: u32::MAX,
            header_table_size: settings::DEFAULT_HEADER_TABLE_SIZE,
            max_frame_size: settings::DEFAULT_MAX_FRAME_SIZE,
            max_header_list_size: None,
            allow_push: settings::DEFAULT_ENABLE_PUSH,
            last_stream_created: None,
        }
    }

    #[inline]
    pub fn endpoint_type(&self) -> endpoint::Type {
        self.endpoint_type
    }

    #[inline]
    pub fn initial_window_size(&self) -> u32 {
        self.initial_window_size
    }

    #[inline]
    pub fn set_initial_window_size(&mut self, size: u32) {
        self.initial_window_size = size;
    }

    #[inline]
    pub fn max_active_streams(&self) -> u32 {
        self.max_active_streams
    }

    #[inline]
    pub fn set_max_active_streams(&mut self, max: u32) {
        self.max_active_streams = max;
    }

    #[inline]
    pub fn header_table_size(&self) -> u32 {
        self.header_table_size
    }

    #[inline]
    pub fn set_header_table_size(&mut self, size: u32) {
        self.header_table_size = size;
    }

    #[inline]
    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }

    #[inline]
    pub fn set_max_frame_size(&mut self, size: u32) {
        self.max_frame_size = size;
    }

    #[inline]
    pub fn max_header_list_size(&self) -> Option<u32> {
        self.max_header_list_size
    }

    #[inline]
    pub fn set_max_header_list_size(&mut self, size: u32) {
        self.max_header_list_size = Some(size);
    }

    /// Whether PUSH_PROMISE frames may be sent toward this endpoint
    #[inline]
    pub fn allow_push(&self) -> bool {
        self.allow_push
    }

    #[inline]
    pub fn set_allow_push(&mut self, allow: bool) {
        self.allow_push = allow;
    }

    /// The highest stream id this endpoint has created, if any
    #[inline]
    pub fn last_stream_created(&self) -> Option<StreamId> {
        self.last_stream_created
    }
}

/// Why a stream could not be created or reserved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateStreamError {
    /// The stream id was used before; the stream is (implicitly) closed
    Closed,
    /// Creating the stream would exceed the advertised concurrency limit
    Refused,
    /// The stream id does not match its initiator's parity
    InvalidId,
    /// The local endpoint does not accept pushed streams
    PushNotSupported,
}

impl CreateStreamError {
    /// Converts the creation failure into the protocol error it implies
    pub fn into_error(self, stream_id: StreamId) -> Error {
        match self {
            Self::Closed => {
                connection_error!(PROTOCOL_ERROR, "frame for a previously closed stream").into()
            }
            Self::Refused => stream_error!(
                stream_id,
                REFUSED_STREAM,
                "exceeded SETTINGS_MAX_CONCURRENT_STREAMS"
            )
            .into(),
            Self::InvalidId => connection_error!(
                PROTOCOL_ERROR,
                "stream identifier does not match its initiator"
            )
            .into(),
            Self::PushNotSupported => {
                connection_error!(PROTOCOL_ERROR, "server push is not enabled").into()
            }
        }
    }
}

/// An HTTP/2 connection: both endpoint halves, the stream registry, and
/// the GOAWAY latches
#[derive(Debug)]
pub struct Connection {
    local: Endpoint,
    remote: Endpoint,
    streams: HashMap<StreamId, Stream>,
    goaway_sent: Option<StreamId>,
    goaway_received: Option<StreamId>,
}

impl Connection {
    /// Creates a connection for the given local endpoint type
    pub fn new(local_type: endpoint::Type) -> Self {
        Self {
            local: Endpoint::new(local_type),
            remote: Endpoint::new(local_type.peer_type()),
            streams: HashMap::new(),
            goaway_sent: None,
            goaway_received: None,
        }
    }

    #[inline]
    pub fn local(&self) -> &Endpoint {
        &self.local
    }

    #[inline]
    pub fn local_mut(&mut self) -> &mut Endpoint {
        &mut self.local
    }

    #[inline]
    pub fn remote(&self) -> &Endpoint {
        &self.remote
    }

    #[inline]
    pub fn remote_mut(&mut self) -> &mut Endpoint {
        &mut self.remote
    }

    /// Looks up a stream, returning `None` for unknown ids
    #[inline]
    pub fn stream(&self, stream_id: StreamId) -> Option<&Stream> {
        self.streams.get(&stream_id)
    }

    #[inline]
    pub fn stream_mut(&mut self, stream_id: StreamId) -> Option<&mut Stream> {
        self.streams.get_mut(&stream_id)
    }

    /// Looks up a stream that is required to exist
    pub fn require_stream(&self, stream_id: StreamId) -> Result<&Stream, ConnectionError> {
        self.streams
            .get(&stream_id)
            .ok_or_else(|| connection_error!(PROTOCOL_ERROR, "frame for an unknown stream"))
    }

    pub fn streams(&self) -> impl Iterator<Item = &Stream> {
        self.streams.values()
    }

    pub fn streams_mut(&mut self) -> impl Iterator<Item = &mut Stream> {
        self.streams.values_mut()
    }

    /// The number of streams counting against `initiator`'s concurrency
    /// limit
    pub fn active_streams(&self, initiator: endpoint::Type) -> usize {
        self.streams
            .values()
            .filter(|stream| stream.is_active() && stream.id().is_initiated_by(initiator))
            .count()
    }

    /// Verifies that activating one more stream for `initiator` stays
    /// within the advertised concurrency limit.
    ///
    /// Idle and reserved streams are free; this check runs whenever one of
    /// them is about to activate, not only when a stream object is first
    /// created.
    pub fn check_stream_capacity(
        &self,
        initiator: endpoint::Type,
    ) -> Result<(), CreateStreamError> {
        //= https://www.rfc-editor.org/rfc/rfc9113#section-5.1.2
        //# An endpoint that receives a HEADERS frame that causes its
        //# advertised concurrent stream limit to be exceeded MUST treat
        //# this as a stream error (Section 5.4.2) of type PROTOCOL_ERROR
        //# or REFUSED_STREAM.
        if self.active_streams(initiator) >= self.endpoint(initiator).max_active_streams as usize {
            return Err(CreateStreamError::Refused);
        }
        Ok(())
    }

    /// Creates a remotely-initiated stream for an inbound HEADERS frame.
    ///
    /// The stream starts in IDLE; the caller opens it. Creation fails when
    /// the id was already used, does not match the peer's parity, or the
    /// peer exceeded the advertised concurrency limit.
    pub fn create_remote_stream(
        &mut self,
        stream_id: StreamId,
    ) -> Result<&mut Stream, CreateStreamError> {
        let initiator = self.remote.endpoint_type;
        self.check_new_stream_id(stream_id, initiator)?;
        self.check_stream_capacity(initiator)?;

        self.record_stream_created(stream_id);
        Ok(self.insert_stream(stream_id))
    }

    /// Creates a locally-initiated stream for an outbound HEADERS frame.
    ///
    /// The stream starts in IDLE; the caller opens it with
    /// [`Stream::open_local`].
    pub fn create_local_stream(
        &mut self,
        stream_id: StreamId,
    ) -> Result<&mut Stream, CreateStreamError> {
        let initiator = self.local.endpoint_type;
        self.check_new_stream_id(stream_id, initiator)?;
        self.check_stream_capacity(initiator)?;

        self.record_stream_created(stream_id);
        Ok(self.insert_stream(stream_id))
    }

    /// Creates a stream in IDLE for priority bookkeeping.
    ///
    /// Either endpoint's parity is accepted; the endpoint is selected by
    /// the id. No concurrency check applies, since idle streams do not
    /// count against the limit. The created-stream watermark does not
    /// advance either: a PRIORITY frame cannot implicitly close
    /// lower-numbered idle streams.
    pub fn create_idle_stream(
        &mut self,
        stream_id: StreamId,
    ) -> Result<&mut Stream, CreateStreamError> {
        let initiator = match stream_id.initiator() {
            Some(initiator) => initiator,
            None => return Err(CreateStreamError::InvalidId),
        };
        self.check_new_stream_id(stream_id, initiator)?;

        Ok(self.insert_stream(stream_id))
    }

    /// Reserves a promised stream announced by PUSH_PROMISE.
    ///
    /// The stream enters RESERVED_REMOTE and depends on its parent with
    /// the default weight.
    pub fn reserve_push_stream(
        &mut self,
        promised_stream_id: StreamId,
        parent_stream_id: StreamId,
    ) -> Result<&mut Stream, CreateStreamError> {
        //= https://www.rfc-editor.org/rfc/rfc9113#section-8.4
        //# A client cannot push.  Thus, server push is semantically
        //# equivalent to a server responding to a request; however, in
        //# this case, that request is also sent by the server, as a
        //# PUSH_PROMISE frame.
        if !self.local.endpoint_type.is_client() {
            return Err(CreateStreamError::PushNotSupported);
        }
        if !self.local.allow_push {
            return Err(CreateStreamError::PushNotSupported);
        }

        let initiator = self.remote.endpoint_type;
        self.check_new_stream_id(promised_stream_id, initiator)?;

        let parent_priority = s2n_http2_core::frame::Priority {
            dependency: parent_stream_id,
            ..Default::default()
        };

        self.record_stream_created(promised_stream_id);
        let stream = self.insert_stream(promised_stream_id);
        stream.set_priority(parent_priority);
        if stream.reserve_remote().is_err() {
            return Err(CreateStreamError::Closed);
        }

        Ok(stream)
    }

    fn check_new_stream_id(
        &self,
        stream_id: StreamId,
        initiator: endpoint::Type,
    ) -> Result<(), CreateStreamError> {
        if !stream_id.is_initiated_by(initiator) {
            return Err(CreateStreamError::InvalidId);
        }

        let endpoint = self.endpoint(initiator);
        if let Some(last) = endpoint.last_stream_created {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-5.1.1
            //# The first use of a new stream identifier implicitly closes
            //# all streams in the "idle" state that might have been
            //# initiated by that peer with a lower-valued stream
            //# identifier.
            if stream_id <= last {
                return Err(CreateStreamError::Closed);
            }
        }

        Ok(())
    }

    fn endpoint(&self, endpoint_type: endpoint::Type) -> &Endpoint {
        if self.local.endpoint_type == endpoint_type {
            &self.local
        } else {
            &self.remote
        }
    }

    fn record_stream_created(&mut self, stream_id: StreamId) {
        if stream_id.is_initiated_by(self.local.endpoint_type) {
            self.local.last_stream_created = Some(stream_id);
        } else {
            self.remote.last_stream_created = Some(stream_id);
        }
    }

    fn insert_stream(&mut self, stream_id: StreamId) -> &mut Stream {
        let stream = Stream::new(
            stream_id,
            self.local.initial_window_size,
            self.remote.initial_window_size,
        );

        self.streams.entry(stream_id).or_insert(stream)
    }

    /// Latches receipt of a peer GOAWAY and records its last-stream id
    pub fn goaway_received(&mut self, last_stream_id: StreamId) {
        self.goaway_received = Some(last_stream_id);
    }

    #[inline]
    pub fn is_goaway_received(&self) -> bool {
        self.goaway_received.is_some()
    }

    #[inline]
    pub fn goaway_received_last_id(&self) -> Option<StreamId> {
        self.goaway_received
    }

    /// Latches that this endpoint sent GOAWAY advertising `last_stream_id`
    pub fn goaway_sent(&mut self, last_stream_id: StreamId) {
        self.goaway_sent = Some(last_stream_id);
    }

    #[inline]
    pub fn is_goaway_sent(&self) -> bool {
        self.goaway_sent.is_some()
    }

    #[inline]
    pub fn goaway_sent_last_id(&self) -> Option<StreamId> {
        self.goaway_sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(id: u32) -> StreamId {
        StreamId::new(id).unwrap()
    }

    #[test]
    fn create_remote_stream_checks_parity() {
        // a server connection accepts client-initiated (odd) streams
        let mut connection = Connection::new(endpoint::Type::Server);
        assert!(connection.create_remote_stream(id(1)).is_ok());
        assert_eq!(
            connection.create_remote_stream(id(2)),
            Err(CreateStreamError::InvalidId)
        );
    }

    #[test]
    fn stream_ids_are_monotone() {
        let mut connection = Connection::new(endpoint::Type::Server);
        connection.create_remote_stream(id(5)).unwrap();
        assert_eq!(
            connection.create_remote_stream(id(3)),
            Err(CreateStreamError::Closed)
        );
        assert_eq!(connection.remote().last_stream_created(), Some(id(5)));
    }

    #[test]
    fn concurrency_limit_refuses_streams() {
        let mut connection = Connection::new(endpoint::Type::Server);
        // the advertised (acknowledged) limit bounds the peer's streams
        connection.remote_mut().set_max_active_streams(1);

        connection
            .create_remote_stream(id(1))
            .unwrap()
            .open(false)
            .unwrap();
        assert_eq!(
            connection.create_remote_stream(id(3)),
            Err(CreateStreamError::Refused)
        );

        // idle streams do not count against the limit
        assert!(connection.create_idle_stream(id(5)).is_ok());
    }

    #[test]
    fn reserve_push_stream_requires_client() {
        let mut connection = Connection::new(endpoint::Type::Server);
        connection.create_remote_stream(id(1)).unwrap();
        assert_eq!(
            connection.reserve_push_stream(id(2), id(1)),
            Err(CreateStreamError::PushNotSupported)
        );

        let mut connection = Connection::new(endpoint::Type::Client);
        connection.local_mut().last_stream_created = Some(id(3));
        connection.streams.insert(
            id(3),
            Stream::new(id(3), 65_535, 65_535),
        );
        let promised = connection.reserve_push_stream(id(2), id(3)).unwrap();
        assert!(promised.state().is_reserved_remote());
        assert_eq!(promised.priority().dependency, id(3));
    }

    #[test]
    fn push_disabled_rejects_reservation() {
        let mut connection = Connection::new(endpoint::Type::Client);
        connection.local_mut().set_allow_push(false);
        assert_eq!(
            connection.reserve_push_stream(id(2), id(1)),
            Err(CreateStreamError::PushNotSupported)
        );
    }

    #[test]
    fn require_stream_raises_for_unknown_ids() {
        let connection = Connection::new(endpoint::Type::Server);
        let error = connection.require_stream(id(9)).unwrap_err();
        assert_eq!(error.code, s2n_http2_core::error::ErrorCode::PROTOCOL_ERROR);
    }
}
