// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! HTTP/2 error codes and the connection/stream error split

use crate::stream::StreamId;
use core::fmt;
use s2n_codec::{decoder_value, DecoderError, Encoder, EncoderValue};

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# Error codes are 32-bit fields that are used in RST_STREAM and GOAWAY
//# frames to convey the reasons for the stream or connection error.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErrorCode(u32);

impl ErrorCode {
    /// Creates an `ErrorCode` from the wire representation
    #[inline]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Returns the wire representation of the `ErrorCode`
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NO_ERROR => f.write_str("NO_ERROR"),
            Self::PROTOCOL_ERROR => f.write_str("PROTOCOL_ERROR"),
            Self::INTERNAL_ERROR => f.write_str("INTERNAL_ERROR"),
            Self::FLOW_CONTROL_ERROR => f.write_str("FLOW_CONTROL_ERROR"),
            Self::SETTINGS_TIMEOUT => f.write_str("SETTINGS_TIMEOUT"),
            Self::STREAM_CLOSED => f.write_str("STREAM_CLOSED"),
            Self::FRAME_SIZE_ERROR => f.write_str("FRAME_SIZE_ERROR"),
            Self::REFUSED_STREAM => f.write_str("REFUSED_STREAM"),
            Self::CANCEL => f.write_str("CANCEL"),
            Self::COMPRESSION_ERROR => f.write_str("COMPRESSION_ERROR"),
            Self::CONNECT_ERROR => f.write_str("CONNECT_ERROR"),
            Self::ENHANCE_YOUR_CALM => f.write_str("ENHANCE_YOUR_CALM"),
            Self::INADEQUATE_SECURITY => f.write_str("INADEQUATE_SECURITY"),
            Self::HTTP_1_1_REQUIRED => f.write_str("HTTP_1_1_REQUIRED"),
            Self(code) => write!(f, "ErrorCode({code})"),
        }
    }
}

decoder_value!(
    impl<'a> ErrorCode {
        fn decode(buffer: Buffer) -> Result<Self> {
            let (code, buffer) = buffer.decode::<u32>()?;
            Ok((ErrorCode(code), buffer))
        }
    }
);

impl EncoderValue for ErrorCode {
    #[inline]
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode(&self.0);
    }
}

/// Internal convenience macro for defining standard error codes
macro_rules! def_error {
    ($doc:expr, $name:ident, $code:expr) => {
        impl ErrorCode {
            #[doc = $doc]
            pub const $name: ErrorCode = ErrorCode($code);
        }
    };
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# NO_ERROR (0x00):  The associated condition is not a result of an
//#    error.  For example, a GOAWAY might include this code to indicate
//#    graceful shutdown of a connection.

def_error!(
    "The associated condition is not a result of an error.",
    NO_ERROR,
    0x0
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# PROTOCOL_ERROR (0x01):  The endpoint detected an unspecific protocol
//#    error.  This error is for use when a more specific error code is
//#    not available.

def_error!(
    "The endpoint detected an unspecific protocol error.",
    PROTOCOL_ERROR,
    0x1
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# INTERNAL_ERROR (0x02):  The endpoint encountered an unexpected
//#    internal error.

def_error!(
    "The endpoint encountered an unexpected internal error.",
    INTERNAL_ERROR,
    0x2
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# FLOW_CONTROL_ERROR (0x03):  The endpoint detected that its peer
//#    violated the flow-control protocol.

def_error!(
    "The endpoint detected that its peer violated the flow-control protocol.",
    FLOW_CONTROL_ERROR,
    0x3
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# SETTINGS_TIMEOUT (0x04):  The endpoint sent a SETTINGS frame but did
//#    not receive a response in a timely manner.

def_error!(
    "The endpoint sent a SETTINGS frame but did not receive a response in a timely manner.",
    SETTINGS_TIMEOUT,
    0x4
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# STREAM_CLOSED (0x05):  The endpoint received a frame after a stream
//#    was half-closed.

def_error!(
    "The endpoint received a frame after a stream was half-closed.",
    STREAM_CLOSED,
    0x5
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# FRAME_SIZE_ERROR (0x06):  The endpoint received a frame with an
//#    invalid size.

def_error!(
    "The endpoint received a frame with an invalid size.",
    FRAME_SIZE_ERROR,
    0x6
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# REFUSED_STREAM (0x07):  The endpoint refused the stream prior to
//#    performing any application processing (see Section 8.7 for
//#    details).

def_error!(
    "The endpoint refused the stream prior to performing any application processing.",
    REFUSED_STREAM,
    0x7
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# CANCEL (0x08):  The endpoint uses this error code to indicate that
//#    the stream is no longer needed.

def_error!(
    "The endpoint uses this error code to indicate that the stream is no longer needed.",
    CANCEL,
    0x8
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# COMPRESSION_ERROR (0x09):  The endpoint is unable to maintain the
//#    field section compression context for the connection.

def_error!(
    "The endpoint is unable to maintain the field section compression context for the connection.",
    COMPRESSION_ERROR,
    0x9
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# CONNECT_ERROR (0x0a):  The connection established in response to a
//#    CONNECT request (Section 8.5) was reset or abnormally closed.

def_error!(
    "The connection established in response to a CONNECT request was reset or abnormally closed.",
    CONNECT_ERROR,
    0xa
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# ENHANCE_YOUR_CALM (0x0b):  The endpoint detected that its peer is
//#    exhibiting a behavior that might be generating excessive load.

def_error!(
    "The endpoint detected that its peer is exhibiting a behavior that might be generating excessive load.",
    ENHANCE_YOUR_CALM,
    0xb
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# INADEQUATE_SECURITY (0x0c):  The underlying transport has properties
//#    that do not meet minimum security requirements (see Section 9.2).

def_error!(
    "The underlying transport has properties that do not meet minimum security requirements.",
    INADEQUATE_SECURITY,
    0xc
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-7
//# HTTP_1_1_REQUIRED (0x0d):  The endpoint requires that HTTP/1.1 be
//#    used instead of HTTP/2.

def_error!(
    "The endpoint requires that HTTP/1.1 be used instead of HTTP/2.",
    HTTP_1_1_REQUIRED,
    0xd
);

//= https://www.rfc-editor.org/rfc/rfc9113#section-5.4.1
//# An endpoint that encounters a connection error SHOULD first send a
//# GOAWAY frame (Section 6.8) with the stream identifier of the last
//# stream that it successfully received from its peer.

/// An error that terminates the entire connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionError {
    pub code: ErrorCode,
    pub reason: &'static str,
}

impl ConnectionError {
    /// Creates a new `ConnectionError` with the specified information
    #[inline]
    pub const fn new(code: ErrorCode, reason: &'static str) -> Self {
        Self { code, reason }
    }

    /// Updates the `ConnectionError` with the specified `reason`
    #[inline]
    pub const fn with_reason(mut self, reason: &'static str) -> Self {
        self.reason = reason;
        self
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "ConnectionError({})", self.code)
        } else {
            f.write_str(self.reason)
        }
    }
}

//= https://www.rfc-editor.org/rfc/rfc9113#section-5.4.2
//# An endpoint that detects a stream error sends a RST_STREAM frame
//# (Section 6.4) that contains the stream identifier of the stream where
//# the error occurred.

/// An error that terminates a single stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamError {
    pub stream_id: StreamId,
    pub code: ErrorCode,
    pub reason: &'static str,
}

impl StreamError {
    /// Creates a new `StreamError` with the specified information
    #[inline]
    pub const fn new(stream_id: StreamId, code: ErrorCode, reason: &'static str) -> Self {
        Self {
            stream_id,
            code,
            reason,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "StreamError({}, {})", self.stream_id, self.code)
        } else {
            f.write_str(self.reason)
        }
    }
}

/// Either kind of HTTP/2 error, as surfaced by the decoder
#[derive(Clone, Copy, Debug, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum Error {
    /// connection error: {0}
    Connection(ConnectionError),
    /// stream error: {0}
    Stream(StreamError),
}

impl Error {
    /// Returns the error code carried by either error kind
    #[inline]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connection(error) => error.code,
            Self::Stream(error) => error.code,
        }
    }

    /// Returns the affected stream id for stream errors
    #[inline]
    pub fn stream_id(&self) -> Option<StreamId> {
        match self {
            Self::Connection(_) => None,
            Self::Stream(error) => Some(error.stream_id),
        }
    }

    /// Returns true if the error terminates the entire connection
    #[inline]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns true if the error terminates a single stream
    #[inline]
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl From<ConnectionError> for Error {
    #[inline]
    fn from(error: ConnectionError) -> Self {
        Self::Connection(error)
    }
}

impl From<StreamError> for Error {
    #[inline]
    fn from(error: StreamError) -> Self {
        Self::Stream(error)
    }
}

/// Creates a `ConnectionError` with variable arguments
#[macro_export]
macro_rules! connection_error {
    ($code:ident) => {
        $crate::error::ConnectionError::new($crate::error::ErrorCode::$code, "")
    };
    ($code:ident, $reason:expr) => {
        $crate::error::ConnectionError::new($crate::error::ErrorCode::$code, $reason)
    };
    ($code:expr, $reason:expr) => {
        $crate::error::ConnectionError::new($code, $reason)
    };
}

/// Creates a `StreamError` with variable arguments
#[macro_export]
macro_rules! stream_error {
    ($stream_id:expr, $code:ident) => {
        $crate::error::StreamError::new($stream_id, $crate::error::ErrorCode::$code, "")
    };
    ($stream_id:expr, $code:ident, $reason:expr) => {
        $crate::error::StreamError::new($stream_id, $crate::error::ErrorCode::$code, $reason)
    };
    ($stream_id:expr, $code:expr, $reason:expr) => {
        $crate::error::StreamError::new($stream_id, $code, $reason)
    };
}

/// Implements conversion from decoder errors
///
/// Truncated or overlong payloads indicate a frame whose length prefix
/// disagrees with its contents; everything else is a malformed frame.
impl From<DecoderError> for ConnectionError {
    fn from(decoder_error: DecoderError) -> Self {
        match decoder_error {
            DecoderError::InvariantViolation(reason) => {
                connection_error!(PROTOCOL_ERROR, reason)
            }
            DecoderError::UnexpectedEof(_) | DecoderError::UnexpectedBytes(_) => {
                connection_error!(FRAME_SIZE_ERROR, "frame payload length mismatch")
            }
            _ => connection_error!(PROTOCOL_ERROR, "malformed frame"),
        }
    }
}

impl From<DecoderError> for Error {
    fn from(decoder_error: DecoderError) -> Self {
        Self::Connection(decoder_error.into())
    }
}
