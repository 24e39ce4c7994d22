#![no_main]

use brook_parser::{Error, Parser, Production};
use libfuzzer_sys::fuzz_target;

// Feeding the document whole and feeding it in chunks must agree, both on
// the token stream (modulo suspension partials) and on the error.
fuzz_target!(|input: (u8, &[u8])| {
    let (size, data) = input;
    let size = usize::from(size.max(1));

    let whole = run(data, data.len().max(1));
    let chunked = run(data, size);
    match (whole, chunked) {
        (Ok(a), Ok(b)) => assert_eq!(coalesce(a), coalesce(b)),
        (Err(a), Err(b)) => assert_eq!(a, b),
        (a, b) => panic!("chunking changed the outcome: {a:?} vs {b:?}"),
    }
});

fn run(data: &[u8], size: usize) -> Result<Vec<Production>, Error> {
    let mut parser = Parser::new().expansion_limit(1 << 16);
    let mut events = Vec::new();
    let chunks: Vec<&[u8]> = if data.is_empty() {
        vec![&[]]
    } else {
        data.chunks(size).collect()
    };
    for (i, chunk) in chunks.iter().enumerate() {
        let mut token = parser.parse(chunk, i == chunks.len() - 1)?;
        loop {
            match token {
                Production::EndOfBuffer => break,
                Production::EndOfData => return Ok(events),
                other => events.push(other),
            }
            token = parser.parse(&[], false)?;
        }
    }
    Ok(events)
}

fn coalesce(events: Vec<Production>) -> Vec<Production> {
    let mut out: Vec<Production> = Vec::new();
    let mut run = String::new();
    fn flush(run: &mut String, out: &mut Vec<Production>) {
        if !run.is_empty() {
            let s = std::mem::take(run);
            if s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n')) {
                out.push(Production::Whitespace(s));
            } else {
                out.push(Production::Text(s));
            }
        }
    }
    for event in events {
        match event {
            Production::Text(s) | Production::Whitespace(s) => run.push_str(&s),
            Production::Cdata(s) => {
                flush(&mut run, &mut out);
                if let Some(Production::Cdata(prev)) = out.last_mut() {
                    prev.push_str(&s);
                } else {
                    out.push(Production::Cdata(s));
                }
            }
            other => {
                flush(&mut run, &mut out);
                out.push(other);
            }
        }
    }
    flush(&mut run, &mut out);
    out
}
