#![no_main]

use libfuzzer_sys::fuzz_target;

use logobj_core::ObjError;
use logobj_runtime::ObjConfig;
use logobj_test::{sample_runtime, QueueState, QUEUE_CLASS};
use logobj_wire::MemStrm;

// Arbitrary bytes must never panic the reader, nor the writer on anything
// the reader accepted
fuzz_target!(|data: &[u8]| {
    let Ok(rt) = sample_runtime(ObjConfig::default()) else {
        return;
    };
    let mut strm = MemStrm::from_bytes(data);
    let mut de = rt.deserializer(&mut strm);

    loop {
        match de.deserialize(QUEUE_CLASS, None) {
            Ok(obj) => {
                assert!(obj.downcast_ref::<QueueState>().is_some());
                let mut out = MemStrm::new();
                let _ = rt.serialize(&mut out, obj.as_ref());
                rt.destroy(obj).unwrap();
            }
            Err(ObjError::EndOfStream) => break,
            Err(_) => {}
        }
    }
});
