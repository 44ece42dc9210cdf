// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The inbound dispatch core
//!
//! Validates every frame against per-stream and per-connection state,
//! applies inbound flow control around DATA delivery, coordinates
//! SETTINGS acknowledgement with the encoder, and dispatches well-typed
//! events to the application listener.

use crate::{
    connection::{Connection, CreateStreamError},
    encoder::ConnectionEncoder,
    flow_controller::{DefaultInboundFlowController, InboundFlowController},
    frame_reader::{FrameReader, HeaderBlock, ReadFrame},
    lifecycle::{DefaultStreamLifecycle, StreamLifecycle},
    listener::FrameReadListener,
    verifier::{AcceptAllVerifier, PromisedRequestVerifier},
};
use s2n_http2_core::{
    connection_error,
    error::{Error, ErrorCode},
    frame::{Data, Ping, Priority, PriorityFrame, ResetStream, Unknown, WindowUpdate},
    settings::Settings,
    stream::{State, StreamId},
    stream_error,
};


/// The result of one `decode_frame` iteration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A complete frame was consumed from the input
    Processed,
    /// The input does not hold a complete frame yet
    MoreDataNeeded,
}

/// The decoder-private dispatch mode.
///
/// The flip to `Running` happens exactly once, inside the first accepted
/// SETTINGS frame, before that frame is dispatched to the running logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DispatchMode {
    AwaitingPreface,
    Running,
}

pub struct ConnectionDecoder<
    Listener,
    Verifier = AcceptAllVerifier,
    Lifecycle = DefaultStreamLifecycle,
    FlowController = DefaultInboundFlowController,
> {
    connection: Connection,
    frame_reader: FrameReader,
    encoder: ConnectionEncoder,
    flow_controller: FlowController,
    lifecycle: Lifecycle,
    verifier: Verifier,
    listener: Listener,
    mode: DispatchMode,
}

impl<Listener: FrameReadListener> ConnectionDecoder<Listener> {
    /// Creates a decoder with default collaborators: an accept-all
    /// promised-request verifier, the default lifecycle manager, and the
    /// default inbound flow controller bound to the encoder via the
    /// decoder's write-queue drain.
    pub fn new(connection: Connection, encoder: ConnectionEncoder, listener: Listener) -> Self {
        Self::with_collaborators(
            connection,
            FrameReader::new(),
            encoder,
            DefaultInboundFlowController::new(),
            DefaultStreamLifecycle,
            AcceptAllVerifier,
            listener,
        )
    }
}

impl<Listener, Verifier, Lifecycle, FlowController>
    ConnectionDecoder<Listener, Verifier, Lifecycle, FlowController>
where
    Listener: FrameReadListener,
    Verifier: PromisedRequestVerifier,
    Lifecycle: StreamLifecycle,
    FlowController: InboundFlowController,
{
    #[allow(clippy::too_many_arguments)]
    pub fn with_collaborators(
        connection: Connection,
        frame_reader: FrameReader,
        encoder: ConnectionEncoder,
        flow_controller: FlowController,
        lifecycle: Lifecycle,
        verifier: Verifier,
        listener: Listener,
    ) -> Self {
        Self {
            connection,
            frame_reader,
            encoder,
            flow_controller,
            lifecycle,
            verifier,
            listener,
            mode: DispatchMode::AwaitingPreface,
        }
    }

    /// Drives one iteration of the frame reader.
    ///
    /// Consumes at most one frame from `input`. All side effects of the
    /// frame (state transitions, listener invocation, staged encoder
    /// writes) are observable when this returns.
    pub fn decode_frame(&mut self, input: &mut &[u8]) -> Result<DecodeOutcome, Error> {
        let before = input.len();

        let frame = match self.frame_reader.read_frame(input) {
            Ok(frame) => frame,
            Err(error) => {
                self.flush_window_updates();
                return Err(error);
            }
        };

        match frame {
            Some(frame) => {
                let result = self.dispatch(frame);
                self.flush_window_updates();
                result.map(|_| DecodeOutcome::Processed)
            }
            // a header-block fragment was buffered
            None if input.len() != before => Ok(DecodeOutcome::Processed),
            None => Ok(DecodeOutcome::MoreDataNeeded),
        }
    }

    /// Returns true once the first SETTINGS frame has been accepted
    #[inline]
    pub fn preface_received(&self) -> bool {
        self.mode == DispatchMode::Running
    }

    /// Snapshots the decoder's current inbound settings
    pub fn local_settings(&self) -> Settings {
        let mut settings = Settings::EMPTY
            .with_header_table_size(self.frame_reader.header_table_size())
            .with_enable_push(self.connection.local().allow_push())
            .with_initial_window_size(self.connection.local().initial_window_size())
            .with_max_frame_size(self.frame_reader.max_frame_size());

        let max_concurrent = self.connection.remote().max_active_streams();
        if max_concurrent != u32::MAX {
            settings = settings.with_max_concurrent_streams(max_concurrent);
        }
        if let Some(size) = self.frame_reader.max_header_list_size() {
            settings = settings.with_max_header_list_size(size);
        }

        settings
    }

    /// Applies the non-absent fields of `settings` to the inbound side.
    ///
    /// This is also the acknowledgement path: when the peer acks a
    /// locally-sent SETTINGS frame, its payload is applied here.
    pub fn apply_local_settings(&mut self, settings: &Settings) -> Result<(), Error> {
        if let Some(enabled) = settings.enable_push() {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.5.2
            //# A server MUST NOT explicitly set this value to 1.
            if self.connection.local().endpoint_type().is_server() {
                return Err(connection_error!(
                    PROTOCOL_ERROR,
                    "servers must not advertise SETTINGS_ENABLE_PUSH"
                )
                .into());
            }
            self.connection.local_mut().set_allow_push(enabled);
        }

        if let Some(max) = settings.max_concurrent_streams() {
            // our advertised limit bounds the streams the peer may open
            self.connection.remote_mut().set_max_active_streams(max);
        }

        if let Some(size) = settings.header_table_size() {
            self.frame_reader.set_header_table_size(size);
        }

        if let Some(size) = settings.max_header_list_size() {
            self.frame_reader.set_max_header_list_size(size);
        }

        if let Some(size) = settings.max_frame_size() {
            self.frame_reader.set_max_frame_size(size);
        }

        if let Some(size) = settings.initial_window_size() {
            self.flow_controller
                .initial_window_size(&mut self.connection, size)?;
        }

        Ok(())
    }

    #[inline]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    #[inline]
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    #[inline]
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    #[inline]
    pub fn listener_mut(&mut self) -> &mut Listener {
        &mut self.listener
    }

    #[inline]
    pub fn flow_controller(&self) -> &FlowController {
        &self.flow_controller
    }

    #[inline]
    pub fn flow_controller_mut(&mut self) -> &mut FlowController {
        &mut self.flow_controller
    }

    #[inline]
    pub fn encoder(&self) -> &ConnectionEncoder {
        &self.encoder
    }

    #[inline]
    pub fn encoder_mut(&mut self) -> &mut ConnectionEncoder {
        &mut self.encoder
    }

    #[inline]
    pub fn frame_reader(&self) -> &FrameReader {
        &self.frame_reader
    }

    /// Releases the frame reader's buffers
    pub fn close(&mut self) {
        self.frame_reader.close();
    }

    fn dispatch(&mut self, frame: ReadFrame) -> Result<(), Error> {
        #[cfg(feature = "event-tracing")]
        tracing::trace!(frame = ?frame);

        match self.mode {
            DispatchMode::AwaitingPreface => self.dispatch_awaiting_preface(frame),
            DispatchMode::Running => self.dispatch_running(frame),
        }
    }

    //= https://www.rfc-editor.org/rfc/rfc9113#section-3.4
    //# That is, the connection preface ... MUST be followed by a
    //# SETTINGS frame, which MAY be empty.
    fn dispatch_awaiting_preface(&mut self, frame: ReadFrame) -> Result<(), Error> {
        match &frame {
            // the mode flips before the frame is handled, so a nested
            // callback observing `preface_received` sees true
            ReadFrame::Settings(_) => {
                self.mode = DispatchMode::Running;
                self.dispatch_running(frame)
            }
            // a peer may shut the connection down without ever sending
            // SETTINGS, and unknown frames are ignored at this layer
            ReadFrame::GoAway { .. } | ReadFrame::Unknown(_) => self.dispatch_running(frame),
            _ => Err(connection_error!(
                PROTOCOL_ERROR,
                "first received frame must be a SETTINGS frame"
            )
            .into()),
        }
    }

    fn dispatch_running(&mut self, frame: ReadFrame) -> Result<(), Error> {
        match frame {
            ReadFrame::Data(frame) => self.on_data(frame),
            ReadFrame::Headers {
                stream_id,
                priority,
                block,
                padding,
                end_of_stream,
            } => self.on_headers(stream_id, priority, block, padding, end_of_stream),
            ReadFrame::Priority(frame) => self.on_priority(frame),
            ReadFrame::ResetStream(frame) => self.on_rst_stream(frame),
            ReadFrame::Settings(settings) => self.on_settings(settings),
            ReadFrame::SettingsAck => self.on_settings_ack(),
            ReadFrame::PushPromise {
                stream_id,
                promised_stream_id,
                block,
                padding,
            } => self.on_push_promise(stream_id, promised_stream_id, block, padding),
            ReadFrame::Ping(frame) => self.on_ping(frame),
            ReadFrame::GoAway {
                last_stream_id,
                error_code,
                debug_data,
            } => self.on_go_away(last_stream_id, error_code, debug_data),
            ReadFrame::WindowUpdate(frame) => self.on_window_update(frame),
            ReadFrame::Unknown(frame) => self.on_unknown(frame),
        }
    }

    /// Raises a connection error once the peer's GOAWAY has been received
    fn verify_goaway_not_received(&self) -> Result<(), Error> {
        if self.connection.is_goaway_received() {
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.8
            //# Once the GOAWAY is sent, the sender will ignore frames sent
            //# on streams initiated by the receiver if the stream has an
            //# identifier higher than the included last stream identifier.
            return Err(connection_error!(
                PROTOCOL_ERROR,
                "Received frames after receiving GO_AWAY"
            )
            .into());
        }
        Ok(())
    }

    /// Decides whether an inbound frame is dropped without touching state.
    ///
    /// A frame is ignored once this endpoint has sent GOAWAY and the
    /// stream falls outside the advertised last-stream id, or when this
    /// endpoint has reset the stream (unless the frame kind is still
    /// meaningful after a local reset). Stream 0 is never ignored.
    fn should_ignore_frame(&self, stream_id: StreamId, allow_after_reset: bool) -> bool {
        if stream_id.is_connection_control() {
            return false;
        }

        let stream = self.connection.stream(stream_id);

        if let Some(last) = self.connection.goaway_sent_last_id() {
            match stream {
                None => return true,
                Some(stream) => {
                    if last <= stream.id() {
                        return true;
                    }
                }
            }
        }

        if !allow_after_reset {
            if let Some(stream) = stream {
                if stream.is_reset_sent() {
                    return true;
                }
            }
        }

        false
    }

    /// The state-validity outcome for a DATA frame, independent of the
    /// ignore decision
    fn data_state_error(&self, stream_id: StreamId) -> Option<Error> {
        let stream = self.connection.stream(stream_id)?;
        match stream.state() {
            State::Open | State::HalfClosedLocal => None,
            //= https://www.rfc-editor.org/rfc/rfc9113#section-6.1
            //# If a DATA frame is received whose stream is not in the "open"
            //# or "half-closed (local)" state, the recipient MUST respond
            //# with a stream error (Section 5.4.2) of type STREAM_CLOSED.
            State::HalfClosedRemote | State::Closed => Some(
                stream_error!(
                    stream_id,
                    STREAM_CLOSED,
                    "DATA received for a half-closed or closed stream"
                )
                .into(),
            ),
            _ => Some(
                stream_error!(
                    stream_id,
                    PROTOCOL_ERROR,
                    "DATA received for a stream in an unexpected state"
                )
                .into(),
            ),
        }
    }

    fn on_data(&mut self, frame: Data) -> Result<(), Error> {
        let stream_id = frame.stream_id;
        let total = frame.flow_controlled_len();

        // DATA requires the stream to already exist; an unknown stream is
        // fatal before any window accounting happens
        self.connection.require_stream(stream_id)?;

        // a failed pre-check still counts the frame toward flow control,
        // with every octet immediately returned, before the error surfaces
        let should_ignore = match self
            .verify_goaway_not_received()
            .map(|_| self.should_ignore_frame(stream_id, false))
        {
            Ok(should_ignore) => should_ignore,
            Err(error) => {
                self.flow_controller.receive_flow_controlled_frame(
                    &mut self.connection,
                    stream_id,
                    frame.data.len(),
                    frame.padding,
                    frame.end_stream,
                )?;
                self.flow_controller
                    .consume_bytes(&mut self.connection, stream_id, total)?;
                return Err(error);
            }
        };

        let state_error = self.data_state_error(stream_id);

        let unconsumed_before = self
            .flow_controller
            .unconsumed_bytes(&self.connection, stream_id);

        let mut bytes_to_return = total;

        // window accounting is mandatory, even for ignored or invalid
        // frames, so the windows stay in sync with the peer
        let mut result = self.flow_controller.receive_flow_controlled_frame(
            &mut self.connection,
            stream_id,
            frame.data.len(),
            frame.padding,
            frame.end_stream,
        );

        if result.is_ok() {
            if should_ignore {
                // skip the listener; the whole frame is returned below
            } else if let Some(error) = state_error {
                result = Err(error);
            } else if let Some(stream) = self.connection.stream_mut(stream_id) {
                match self
                    .listener
                    .on_data_read(stream, frame.data, frame.padding, frame.end_stream)
                {
                    Ok(processed) => bytes_to_return = processed,
                    Err(error) => result = Err(error),
                }
            }
        }

        if result.is_err() {
            // the listener may have held part of the payload before
            // failing; held octets are not returned to the window
            let unconsumed_after = self
                .flow_controller
                .unconsumed_bytes(&self.connection, stream_id);
            let newly_unconsumed = unconsumed_after.saturating_sub(unconsumed_before) as usize;
            bytes_to_return = bytes_to_return.saturating_sub(newly_unconsumed);
        }

        // finalization runs on every exit path
        if bytes_to_return > 0 {
            let consumed =
                self.flow_controller
                    .consume_bytes(&mut self.connection, stream_id, bytes_to_return);
            if result.is_ok() {
                result = consumed;
            }
        }

        if frame.end_stream {
            let closed = self
                .lifecycle
                .close_remote_side(&mut self.connection, stream_id);
            if result.is_ok() {
                result = closed;
            }
        }

        result
    }

    fn on_headers(
        &mut self,
        stream_id: StreamId,
        priority: Option<Priority>,
        block: HeaderBlock,
        padding: usize,
        end_of_stream: bool,
    ) -> Result<(), Error> {
        // the short form (no priority fields) behaves as the long form
        // with the default triple
        let priority = priority.unwrap_or_default();

        self.verify_goaway_not_received()?;

        if self.should_ignore_frame(stream_id, false) {
            return Ok(());
        }

        match self.connection.stream(stream_id).map(|s| s.state().clone()) {
            None => {
                match self.connection.create_remote_stream(stream_id) {
                    Ok(stream) => stream.open(end_of_stream)?,
                    Err(error) => return Err(error.into_error(stream_id)),
                }
            }
            Some(State::ReservedRemote) | Some(State::Idle) => {
                // streams pre-seeded by PRIORITY or PUSH_PROMISE did not
                // count against the concurrency limit while dormant; they
                // are subject to it the moment they activate
                if let Some(initiator) = stream_id.initiator() {
                    if let Err(error) = self.connection.check_stream_capacity(initiator) {
                        return Err(error.into_error(stream_id));
                    }
                }
                if let Some(stream) = self.connection.stream_mut(stream_id) {
                    stream.open(end_of_stream)?;
                }
            }
            // trailers on an existing stream
            Some(State::Open) | Some(State::HalfClosedLocal) => {}
            Some(State::HalfClosedRemote) | Some(State::Closed) => {
                return Err(stream_error!(
                    stream_id,
                    STREAM_CLOSED,
                    "HEADERS received for a half-closed or closed stream"
                )
                .into())
            }
            Some(State::ReservedLocal) => {
                return Err(connection_error!(
                    PROTOCOL_ERROR,
                    "HEADERS received for a stream in an unexpected state"
                )
                .into())
            }
        }

        if let Some(stream) = self.connection.stream_mut(stream_id) {
            self.listener.on_headers_read(
                stream,
                block.as_slice(),
                priority,
                padding,
                end_of_stream,
            )?;
        }

        self.record_priority(stream_id, priority, false)?;

        if end_of_stream {
            self.lifecycle
                .close_remote_side(&mut self.connection, stream_id)?;
        }

        Ok(())
    }

    /// Records the priority triple on a stream, implicitly creating the
    /// parent in IDLE when the dependency names an unknown stream.
    ///
    /// `swallow_closed` relaxes the creation checks for PRIORITY frames:
    /// prioritizing a just-closed parent is benign.
    fn record_priority(
        &mut self,
        stream_id: StreamId,
        priority: Priority,
        swallow_closed: bool,
    ) -> Result<(), Error> {
        if !priority.dependency.is_connection_control()
            && self.connection.stream(priority.dependency).is_none()
        {
            match self.connection.create_idle_stream(priority.dependency) {
                Ok(_) => {}
                Err(CreateStreamError::Closed) if swallow_closed => {}
                Err(error) => return Err(error.into_error(priority.dependency)),
            }
        }

        if let Some(stream) = self.connection.stream_mut(stream_id) {
            stream.set_priority(priority);
        }

        Ok(())
    }

    fn on_priority(&mut self, frame: PriorityFrame) -> Result<(), Error> {
        let stream_id = frame.stream_id;

        self.verify_goaway_not_received()?;

        // PRIORITY is still meaningful for streams this endpoint has reset
        if self.should_ignore_frame(stream_id, true) {
            return Ok(());
        }

        // the frame may implicitly create the stream in IDLE; a creation
        // race with closure is benign for PRIORITY
        let mut record = true;
        if self.connection.stream(stream_id).is_none() {
            match self.connection.create_idle_stream(stream_id) {
                Ok(_) => {}
                Err(CreateStreamError::Closed) => record = false,
                Err(error) => return Err(error.into_error(stream_id)),
            }
        }

        if record {
            self.record_priority(stream_id, frame.priority, true)?;
        }

        self.listener.on_priority_read(stream_id, frame.priority)?;

        Ok(())
    }

    fn on_rst_stream(&mut self, frame: ResetStream) -> Result<(), Error> {
        let stream_id = frame.stream_id;

        self.connection.require_stream(stream_id)?;
        self.verify_goaway_not_received()?;

        // a reset for an already-closed stream is a no-op
        if let Some(stream) = self.connection.stream_mut(stream_id) {
            if stream.state().is_closed() {
                return Ok(());
            }
            stream.set_reset_received();
        }

        self.listener.on_rst_stream_read(stream_id, frame.error_code)?;

        self.lifecycle.close_stream(&mut self.connection, stream_id)?;

        Ok(())
    }

    fn on_settings(&mut self, settings: Settings) -> Result<(), Error> {
        self.verify_goaway_not_received()?;

        // the peer's settings constrain our outbound behavior and are
        // installed immediately
        self.encoder
            .remote_settings(&mut self.connection, &settings)?;

        // the acknowledgement is staged and flushed before the listener
        // runs, so any write the listener issues follows it on the wire
        self.encoder.write_settings_ack();
        self.encoder.flush();

        self.listener.on_settings_read(&settings)?;

        Ok(())
    }

    fn on_settings_ack(&mut self) -> Result<(), Error> {
        self.verify_goaway_not_received()?;

        // our own settings take effect only when the peer acknowledges
        // them, one FIFO entry per acknowledgement
        if let Some(settings) = self.encoder.poll_sent_settings() {
            self.apply_local_settings(&settings)?;
        }

        self.listener.on_settings_ack_read()?;

        Ok(())
    }

    fn on_ping(&mut self, frame: Ping) -> Result<(), Error> {
        self.verify_goaway_not_received()?;

        if frame.ack {
            self.listener.on_ping_ack_read(frame.data)?;
        } else {
            // the opaque payload was copied out of the receive buffer at
            // decode time, so the deferred write is safe
            self.encoder.write_ping_ack(frame.data);
            self.encoder.flush();
            self.listener.on_ping_read(frame.data)?;
        }

        Ok(())
    }

    fn on_push_promise(
        &mut self,
        stream_id: StreamId,
        promised_stream_id: StreamId,
        block: HeaderBlock,
        padding: usize,
    ) -> Result<(), Error> {
        self.connection.require_stream(stream_id)?;
        self.verify_goaway_not_received()?;

        if self.should_ignore_frame(stream_id, false) {
            return Ok(());
        }

        //= https://www.rfc-editor.org/rfc/rfc9113#section-6.6
        //# PUSH_PROMISE frames MUST only be sent on a peer-initiated stream
        //# that is in either the "open" or "half-closed (remote)" state.
        let parent_state = self.connection.stream(stream_id).map(|s| s.state().clone());
        match parent_state {
            Some(State::Open) | Some(State::HalfClosedLocal) => {}
            _ => {
                return Err(connection_error!(
                    PROTOCOL_ERROR,
                    "PUSH_PROMISE received for a stream in an unexpected state"
                )
                .into())
            }
        }

        // the three policy checks are separate so a rejection identifies
        // the one that was violated; the error names the promised stream
        if let Some(parent) = self.connection.stream(stream_id) {
            if !self.verifier.is_authoritative(parent, block.as_slice()) {
                return Err(stream_error!(
                    promised_stream_id,
                    PROTOCOL_ERROR,
                    "promised request is not authoritative"
                )
                .into());
            }
        }
        if !self.verifier.is_cacheable(block.as_slice()) {
            return Err(stream_error!(
                promised_stream_id,
                PROTOCOL_ERROR,
                "promised request is not known to be cacheable"
            )
            .into());
        }
        if !self.verifier.is_safe(block.as_slice()) {
            return Err(stream_error!(
                promised_stream_id,
                PROTOCOL_ERROR,
                "promised request is not known to be safe"
            )
            .into());
        }

        self.connection
            .reserve_push_stream(promised_stream_id, stream_id)
            .map_err(|error| error.into_error(promised_stream_id))?;

        self.listener.on_push_promise_read(
            stream_id,
            promised_stream_id,
            block.as_slice(),
            padding,
        )?;

        Ok(())
    }

    fn on_go_away(
        &mut self,
        last_stream_id: StreamId,
        error_code: ErrorCode,
        debug_data: &[u8],
    ) -> Result<(), Error> {
        // runs even when a GOAWAY was already received: peers may send
        // several as shutdown progresses
        self.connection.goaway_received(last_stream_id);

        self.listener
            .on_go_away_read(last_stream_id, error_code, debug_data)?;

        Ok(())
    }

    fn on_window_update(&mut self, frame: WindowUpdate) -> Result<(), Error> {
        let stream_id = frame.stream_id;

        if stream_id.is_connection_control() {
            self.verify_goaway_not_received()?;
            self.encoder.window_update_received(
                &mut self.connection,
                stream_id,
                frame.window_size_increment,
            )?;
            self.listener
                .on_window_update_read(stream_id, frame.window_size_increment)?;
            return Ok(());
        }

        self.connection.require_stream(stream_id)?;
        self.verify_goaway_not_received()?;

        let closed = self
            .connection
            .stream(stream_id)
            .map(|stream| stream.state().is_closed())
            .unwrap_or(true);
        if closed || self.should_ignore_frame(stream_id, false) {
            return Ok(());
        }

        // increments belong to the outbound flow controller; zero and
        // overflow policy surface as its errors
        self.encoder.window_update_received(
            &mut self.connection,
            stream_id,
            frame.window_size_increment,
        )?;

        self.listener
            .on_window_update_read(stream_id, frame.window_size_increment)?;

        Ok(())
    }

    fn on_unknown(&mut self, frame: Unknown) -> Result<(), Error> {
        // never an error at the protocol layer; the listener may inspect
        // extension frames
        self.listener.on_unknown_frame(
            frame.frame_type,
            frame.stream_id,
            frame.flags,
            frame.payload,
        )?;

        Ok(())
    }

    fn flush_window_updates(&mut self) {
        let updates = self.flow_controller.take_pending_window_updates();
        if updates.is_empty() {
            return;
        }
        for update in updates {
            self.encoder.write_window_update(update);
        }
        self.encoder.flush();
    }
}
