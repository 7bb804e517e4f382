#![no_main]
use std::{
    future::Future,
    pin::pin,
    task::{Context, Poll, Waker},
};

use libfuzzer_sys::fuzz_target;
use nts_ke_proto::Record;

fn parse(data: &[u8]) -> Option<Record> {
    // reading from a slice never suspends
    let Poll::Ready(result) =
        pin!(Record::read(data)).poll(&mut Context::from_waker(Waker::noop()))
    else {
        panic!("Future stalled unexpectedly");
    };

    result.ok()
}

fuzz_target!(|data: &[u8]| {
    if let Some(record) = parse(data) {
        let mut buf = vec![];
        record.serialize(&mut buf).unwrap();
        assert_eq!(parse(&buf), Some(record));
    }
});
