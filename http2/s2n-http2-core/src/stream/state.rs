// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::state::{event, is};

//= https://www.rfc-editor.org/rfc/rfc9113#section-5.1
//#                               +--------+
//#                       send PP |        | recv PP
//#                      ,--------+  idle  +--------.
//#                     /         |        |         \
//#                    v          +--------+          v
//#             +----------+          |           +----------+
//#             |          |          | send H /  |          |
//#      ,------+ reserved |          | recv H    | reserved +------.
//#      |      | (local)  |          |           | (remote) |      |
//#      |      +---+------+          v           +------+---+      |
//#      |          |             +--------+             |          |
//#      |          |     recv ES |        | send ES     |          |
//#      |   send H |     ,-------+  open  +-------.     | recv H   |
//#      |          |    /        |        |        \    |          |
//#      |          v   v         +---+----+         v   v          |
//#      |      +----------+          |           +----------+      |
//#      |      |   half-  |          | send R /  |   half-  |      |
//#      |      |  closed  |          | recv R    |  closed  |      |
//#      |      | (remote) |          |           | (local)  |      |
//#      |      +----+-----+          |           +-----+----+      |
//#      |           |                |                 |           |
//#      |           | send ES /      |       recv ES / |           |
//#      |           | send R /       v        send R / |           |
//#      |           | recv R     +--------+   recv R   |           |
//#      |           `----------->|        |<-----------'           |
//#      |  send R /              | closed |               recv R / |
//#      |  recv R                |        |                 send R |
//#      `----------------------->+--------+<----------------------'

/// The state of an HTTP/2 stream, viewed from one endpoint.
///
/// Events named `recv` describe frames arriving from the peer; events
/// named `send` describe frames this endpoint emits. Every event moves
/// the state strictly toward `Closed`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    ReservedLocal,
    ReservedRemote,
    Open,
    HalfClosedLocal,
    HalfClosedRemote,
    Closed,
}

impl State {
    is!(is_idle, Idle);
    is!(is_reserved_local, ReservedLocal);
    is!(is_reserved_remote, ReservedRemote);
    is!(is_open, Open);
    is!(is_half_closed_local, HalfClosedLocal);
    is!(is_half_closed_remote, HalfClosedRemote);
    is!(is_closed, Closed);
    is!(
        /// Returns true if the peer may still send DATA on the stream
        is_receivable,
        Open | HalfClosedLocal
    );

    event! {
        on_send_push_promise(Idle => ReservedLocal);
        on_recv_push_promise(Idle => ReservedRemote);

        on_send_headers(Idle => Open, ReservedLocal => HalfClosedRemote);
        on_recv_headers(Idle => Open, ReservedRemote => HalfClosedLocal);

        on_send_end_stream(Open => HalfClosedLocal, HalfClosedRemote => Closed);
        on_recv_end_stream(Open => HalfClosedRemote, HalfClosedLocal => Closed);

        on_reset(
            Idle | ReservedLocal | ReservedRemote | Open | HalfClosedLocal | HalfClosedRemote
                => Closed
        );
    }
}
