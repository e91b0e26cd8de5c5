//! Ports - 抽象化レイヤー
//!
//! コーディネーターが外部に求めるもの（時刻、ID、ドメインイベントの出口）を
//! trait として定義し、実装の詳細を隠蔽します。

pub mod clock;
pub mod event_sink;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::{EventSink, NoopEventSink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
