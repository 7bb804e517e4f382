#![no_main]
use std::{
    future::Future,
    pin::pin,
    task::{Context, Poll, Waker},
};

use libfuzzer_sys::fuzz_target;
use nts_ke_proto::{read_negotiated_data, NegotiatedData};

fuzz_target!(|data: &[u8]| {
    let mut negotiated = NegotiatedData::new("fuzz.example");
    let poll = pin!(read_negotiated_data(data, &mut negotiated))
        .poll(&mut Context::from_waker(Waker::noop()));
    let Poll::Ready(result) = poll else {
        panic!("Future stalled unexpectedly");
    };

    if result.is_ok() {
        // keys are only set by the exporter
        assert!(negotiated.c2s_key.is_none());
        assert!(negotiated.s2c_key.is_none());
    }
});
