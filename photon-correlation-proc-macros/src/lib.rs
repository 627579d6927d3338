extern crate proc_macro;
use proc_macro::TokenStream;
use quote::{quote, format_ident};
use syn::parse::{Parse, ParseStream, Result};
use syn::{parse_macro_input, Ident, LitInt, Token};

struct BinaryStreamArgs {
    record_kind: Ident,
    record_size: LitInt,
}

impl Parse for BinaryStreamArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let record_kind: Ident = input.parse()?;
        input.parse::<Token![,]>()?;
        let record_size: LitInt = input.parse()?;

        Ok(BinaryStreamArgs {
            record_kind,
            record_size,
        })
    }
}

// example use
// #[make_binary_stream(T2, 12)]
// fn parse_record(record: &[u8]) -> T2Event { ... }
//
// expands to a `T2BinaryStream<R: Read>` iterator over `Result<T2Event, Error>`.
// `Error`, `BinaryStream` and `BUFFER_SIZE` must be in scope at the call site.
#[proc_macro_attribute]
pub fn make_binary_stream(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as syn::ItemFn);
    let BinaryStreamArgs {
        record_kind,
        record_size,
    } = parse_macro_input!(args as BinaryStreamArgs);
    let stream_name = format_ident!("{}BinaryStream", record_kind);
    let event_name = format_ident!("{}Event", record_kind);

    let output = quote!{
        pub struct #stream_name<R: std::io::Read> {
            source: std::io::BufReader<R>,
            record_buffer: [u8; #record_size],
            record_count: usize,
        }

        impl<R: std::io::Read> #stream_name<R> {
            pub fn new(source: R) -> Self {
                Self {
                    source: std::io::BufReader::with_capacity(BUFFER_SIZE, source),
                    record_buffer: [0; #record_size],
                    record_count: 0,
                }
            }

            /// Number of records pulled from the source so far.
            pub fn records_read(&self) -> usize {
                self.record_count
            }
        }

        impl<R: std::io::Read> BinaryStream for #stream_name<R> {
            type Record = #event_name;
            const RECORD_SIZE: usize = #record_size;

            #[inline(always)]
            #input
        }

        impl<R: std::io::Read> Iterator for #stream_name<R> {
            type Item = Result<#event_name, Error>;

            #[inline(always)]
            fn next(&mut self) -> Option<Self::Item> {
                loop {
                    match std::io::BufRead::fill_buf(&mut self.source) {
                        Ok(pending) if pending.is_empty() => return None,
                        Ok(_) => break,
                        Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => return Some(Err(Error::from(e))),
                    }
                }

                self.record_count += 1;
                match std::io::Read::read_exact(&mut self.source, &mut self.record_buffer) {
                    Ok(()) => {}
                    Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                        return Some(Err(Error::MalformedRecord {
                            record: self.record_count,
                            reason: format!("truncated record, expected {} bytes", #record_size),
                        }));
                    }
                    Err(e) => return Some(Err(Error::from(e))),
                }

                Some(Ok(<Self as BinaryStream>::parse_record(&self.record_buffer)))
            }
        }
    };
    output.into()
}
