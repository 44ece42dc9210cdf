// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The per-stream state tracked by the decoder

use s2n_http2_core::{
    connection_error,
    error::Error,
    frame::Priority,
    stream::{State, StreamId},
};

/// Receive-direction flow-control counters for one stream.
///
/// `window` is the credit the peer may still spend. `processed_window`
/// trails behind it by the number of received octets that have not been
/// returned via `consume_bytes` yet; the gap is what a WINDOW_UPDATE can
/// regenerate. `unconsumed` counts octets the application has explicitly
/// marked as held during delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecvFlow {
    window: i64,
    processed_window: i64,
    unconsumed: u64,
}

impl RecvFlow {
    pub(crate) fn new(initial_window_size: u32) -> Self {
        Self {
            window: i64::from(initial_window_size),
            processed_window: i64::from(initial_window_size),
            unconsumed: 0,
        }
    }

    /// The credit the peer may still spend
    #[inline]
    pub fn window(&self) -> i64 {
        self.window
    }

    /// The window as the application has processed it
    #[inline]
    pub fn processed_window(&self) -> i64 {
        self.processed_window
    }

    /// Received octets that have not been returned to the window yet
    #[inline]
    pub fn unprocessed_bytes(&self) -> u64 {
        (self.processed_window - self.window).max(0) as u64
    }

    /// Octets the application has marked as held
    #[inline]
    pub fn unconsumed_bytes(&self) -> u64 {
        self.unconsumed
    }

    /// Charges a received flow-controlled frame against the window.
    ///
    /// Fails when the peer spends more credit than was advertised.
    pub(crate) fn receive(&mut self, bytes: usize) -> Result<(), ()> {
        let bytes = bytes as i64;
        if bytes > self.window {
            return Err(());
        }
        self.window -= bytes;
        Ok(())
    }

    /// Returns processed octets toward window regeneration.
    ///
    /// Fails when more octets are returned than were received.
    pub(crate) fn consume(&mut self, bytes: usize) -> Result<(), ()> {
        let bytes = bytes as i64;
        if bytes > self.processed_window - self.window {
            return Err(());
        }
        self.processed_window -= bytes;
        Ok(())
    }

    /// Regenerates the window up to `target` once the processed window has
    /// fallen to `threshold` or below. Returns the WINDOW_UPDATE increment.
    pub(crate) fn release_quota(&mut self, target: u32, threshold: i64) -> Option<u32> {
        if self.processed_window > threshold {
            return None;
        }
        let delta = i64::from(target) - self.processed_window;
        if delta <= 0 {
            return None;
        }
        self.window += delta;
        self.processed_window += delta;
        Some(delta as u32)
    }

    /// Retroactively adjusts the window by an initial-window-size delta.
    ///
    /// Fails when the window would exceed the maximum window size.
    pub(crate) fn adjust(&mut self, delta: i64) -> Result<(), ()> {
        let window = self.window + delta;
        let processed_window = self.processed_window + delta;
        if window > i64::from(s2n_http2_core::settings::MAX_WINDOW_SIZE) {
            return Err(());
        }
        self.window = window;
        self.processed_window = processed_window;
        Ok(())
    }

    /// Marks octets delivered to the application as held rather than
    /// processed
    #[inline]
    pub fn mark_unconsumed(&mut self, bytes: usize) {
        self.unconsumed += bytes as u64;
    }

    /// Releases previously held octets; pair with `consume_bytes` to
    /// return them to the window
    #[inline]
    pub fn release_unconsumed(&mut self, bytes: usize) {
        self.unconsumed = self.unconsumed.saturating_sub(bytes as u64);
    }
}

/// A single HTTP/2 stream as tracked by the connection registry
#[derive(Clone, Debug, PartialEq)]
pub struct Stream {
    id: StreamId,
    state: State,
    priority: Priority,
    reset_sent: bool,
    reset_received: bool,
    recv_flow: RecvFlow,
    send_window: i64,
}

impl Stream {
    pub(crate) fn new(id: StreamId, recv_window: u32, send_window: u32) -> Self {
        Self {
            id,
            state: State::Idle,
            priority: Priority::default(),
            reset_sent: false,
            reset_received: false,
            recv_flow: RecvFlow::new(recv_window),
            send_window: i64::from(send_window),
        }
    }

    #[inline]
    pub fn id(&self) -> StreamId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The dependency/weight/exclusive triple last recorded for the stream
    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[inline]
    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// True once this endpoint has emitted RST_STREAM for the stream
    #[inline]
    pub fn is_reset_sent(&self) -> bool {
        self.reset_sent
    }

    /// Latches the reset-sent marker; further inbound frames are ignored
    /// for most frame kinds
    #[inline]
    pub fn set_reset_sent(&mut self) {
        self.reset_sent = true;
    }

    /// True once the peer has sent RST_STREAM for the stream
    #[inline]
    pub fn is_reset_received(&self) -> bool {
        self.reset_received
    }

    #[inline]
    pub fn set_reset_received(&mut self) {
        self.reset_received = true;
    }

    #[inline]
    pub fn recv_flow(&self) -> &RecvFlow {
        &self.recv_flow
    }

    #[inline]
    pub fn recv_flow_mut(&mut self) -> &mut RecvFlow {
        &mut self.recv_flow
    }

    /// The credit this endpoint may still spend sending on the stream
    #[inline]
    pub fn send_window(&self) -> i64 {
        self.send_window
    }

    pub(crate) fn set_send_window(&mut self, window: i64) {
        self.send_window = window;
    }

    /// Streams in the open or half-closed states count against the
    /// concurrency limit
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            State::Open | State::HalfClosedLocal | State::HalfClosedRemote
        )
    }

    /// Activates the stream for inbound HEADERS.
    ///
    /// An idle stream becomes open (or half-closed (remote) when the frame
    /// also ended the stream); a reserved (remote) stream becomes
    /// half-closed (local).
    pub fn open(&mut self, end_of_stream: bool) -> Result<(), Error> {
        match self.state {
            State::Idle => {
                self.state.on_recv_headers().map_err(out_of_sync)?;
                if end_of_stream {
                    self.state.on_recv_end_stream().map_err(out_of_sync)?;
                }
            }
            State::ReservedRemote => {
                self.state.on_recv_headers().map_err(out_of_sync)?;
            }
            _ => {
                return Err(connection_error!(
                    PROTOCOL_ERROR,
                    "attempted to open a stream in an unexpected state"
                )
                .into())
            }
        }
        Ok(())
    }

    /// Activates the stream for outbound HEADERS.
    ///
    /// The symmetric twin of [`Stream::open`] for streams this endpoint
    /// initiates.
    pub fn open_local(&mut self, end_of_stream: bool) -> Result<(), Error> {
        match self.state {
            State::Idle => {
                self.state.on_send_headers().map_err(out_of_sync)?;
                if end_of_stream {
                    self.state.on_send_end_stream().map_err(out_of_sync)?;
                }
            }
            State::ReservedLocal => {
                self.state.on_send_headers().map_err(out_of_sync)?;
            }
            _ => {
                return Err(connection_error!(
                    PROTOCOL_ERROR,
                    "attempted to open a stream in an unexpected state"
                )
                .into())
            }
        }
        Ok(())
    }

    /// Reserves the stream for a promised push response
    pub(crate) fn reserve_remote(&mut self) -> Result<(), Error> {
        self.state.on_recv_push_promise().map_err(out_of_sync)?;
        Ok(())
    }

    /// Transitions the stream after the remote side finished sending
    pub(crate) fn close_remote_side(&mut self) {
        match self.state {
            State::Open | State::HalfClosedLocal => {
                let _ = self.state.on_recv_end_stream();
            }
            State::HalfClosedRemote | State::Closed => {}
            // closing the remote half of a stream that never opened closes
            // it entirely
            _ => {
                let _ = self.state.on_reset();
            }
        }
    }

    /// Fully closes the stream
    pub(crate) fn close(&mut self) {
        let _ = self.state.on_reset();
    }
}

fn out_of_sync<T>(_: s2n_http2_core::state::Error<T>) -> Error {
    connection_error!(INTERNAL_ERROR, "stream state out of sync").into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(id: u32) -> Stream {
        Stream::new(StreamId::new(id).unwrap(), 65_535, 65_535)
    }

    #[test]
    fn open_with_end_of_stream() {
        let mut stream = stream(1);
        stream.open(true).unwrap();
        assert!(stream.state().is_half_closed_remote());

        // finishing the remote side again is a no-op
        stream.close_remote_side();
        assert!(stream.state().is_half_closed_remote());
    }

    #[test]
    fn open_reserved_remote() {
        let mut stream = stream(2);
        stream.reserve_remote().unwrap();
        stream.open(false).unwrap();
        assert!(stream.state().is_half_closed_local());

        stream.close_remote_side();
        assert!(stream.state().is_closed());
    }

    #[test]
    fn recv_flow_accounting() {
        let mut flow = RecvFlow::new(100);
        flow.receive(60).unwrap();
        assert_eq!(flow.window(), 40);
        assert_eq!(flow.unprocessed_bytes(), 60);

        flow.consume(60).unwrap();
        assert_eq!(flow.unprocessed_bytes(), 0);

        // regeneration kicks in at the threshold
        let increment = flow.release_quota(100, 50).unwrap();
        assert_eq!(increment, 60);
        assert_eq!(flow.window(), 100);
        assert_eq!(flow.processed_window(), 100);
    }

    #[test]
    fn recv_flow_rejects_overspend() {
        let mut flow = RecvFlow::new(10);
        assert!(flow.receive(11).is_err());
        flow.receive(10).unwrap();
        assert!(flow.consume(11).is_err());
    }

    #[test]
    fn recv_flow_adjust_bounds() {
        let mut flow = RecvFlow::new(100);
        flow.adjust(-150).unwrap();
        assert_eq!(flow.window(), -50);

        let mut flow = RecvFlow::new(100);
        assert!(flow
            .adjust(i64::from(s2n_http2_core::settings::MAX_WINDOW_SIZE))
            .is_err());
    }
}
