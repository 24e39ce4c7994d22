#![no_main]

use brook_parser::{Parser, Production};
use libfuzzer_sys::fuzz_target;

// Whatever the bytes, the parser must stop with a clean token stream or a
// clean error; panics and runaway loops are bugs.
fuzz_target!(|data: &[u8]| {
    let mut parser = Parser::new().expansion_limit(1 << 16);
    let mut token = match parser.parse(data, true) {
        Ok(token) => token,
        Err(_) => return,
    };
    loop {
        match token {
            Production::EndOfBuffer | Production::EndOfData => break,
            _ => {}
        }
        token = match parser.parse(&[], false) {
            Ok(token) => token,
            Err(_) => return,
        };
    }
});
