#![no_main]

use libfuzzer_sys::fuzz_target;
use netframe::core::buffer::ByteBuffer;
use netframe::core::codec::{read_fields, read_fields_lenient};
use netframe::core::schema::Schema;

fuzz_target!(|data: &[u8]| {
    let schema = Schema::new()
        .field("id", "id")
        .field("name", "string")
        .field("pos", "vector")
        .field("rot", "rotator")
        .field("flag", "bool");

    let mut buffer = ByteBuffer::from_bytes(data);
    let _ = read_fields(&mut buffer, &schema, 1);
    buffer.rewind();
    let _ = read_fields_lenient(&mut buffer, &schema, 1);
});
