use proc_macro::TokenStream;
use syn::DeriveInput;

macro_rules! error {
    ($($tt:tt)*) => {
        return Err(syn::Error::new(proc_macro::Span::call_site().into(), format!($($tt)*)))
    };
}

pub(crate) use error;

mod from_record;
mod decode;

/// Derive `FromRecord` and `Decode` for struct.
///
/// Named fields are taken by name, tuple fields by position. A field can be
/// renamed with `#[record("name")]`.
#[proc_macro_derive(FromRecord, attributes(record))]
pub fn from_record(input: TokenStream) -> TokenStream {
    match from_record::from_record(syn::parse_macro_input!(input as DeriveInput)) {
        Ok(ok) => ok,
        Err(err) => err.into_compile_error().into(),
    }
}

/// Derive `Decode` for single field struct.
#[proc_macro_derive(Decode)]
pub fn decode(input: TokenStream) -> TokenStream {
    match decode::decode(syn::parse_macro_input!(input as DeriveInput)) {
        Ok(ok) => ok,
        Err(err) => err.into_compile_error().into(),
    }
}
