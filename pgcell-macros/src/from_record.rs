use proc_macro::TokenStream;
use quote::quote;
use syn::{token::{Brace, Paren}, *};
use crate::error;

pub fn from_record(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput { attrs: _, vis: _, ident, mut generics, data } = input;
    let Data::Struct(data) = data else {
        error!("only struct are supported")
    };

    let mut output = quote! {};

    match data.fields {
        Fields::Unnamed(FieldsUnnamed { unnamed, .. }) => {
            let body = (0..unnamed.len())
                .map(|i|quote! { record.try_take::<usize, _>(#i)?, });
            Paren::default().surround(&mut output, |e|e.extend(body));
        },
        Fields::Named(FieldsNamed { named, .. }) => {
            let body = named
                .iter()
                .map(|field|{
                    let Some(id) = field.ident.as_ref() else {
                        error!("field without name")
                    };
                    let name = field_name(field)?.unwrap_or_else(||id.to_string());
                    Ok(quote! { #id: record.try_take::<&str, _>(#name)?, })
                })
                .collect::<Result<Vec<_>>>()?;
            Brace::default().surround(&mut output, |e|e.extend(body));
        }
        Fields::Unit => {}
    };

    for ty in generics.type_params_mut() {
        ty.bounds.push(syn::parse_quote!(::pgcell::Decode));
    }

    let (g1, g2, g3) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #g1 ::pgcell::FromRecord for #ident #g2 #g3 {
            #[allow(unused_mut, unused_variables)]
            fn from_record(mut record: ::pgcell::Record) -> Result<Self, ::pgcell::DecodeError> {
                Ok(Self #output)
            }
        }

        #[automatically_derived]
        impl #g1 ::pgcell::Decode for #ident #g2 #g3 {
            fn decode(value: ::pgcell::Value) -> Result<Self, ::pgcell::DecodeError> {
                match value {
                    ::pgcell::Value::Record(record) => ::pgcell::FromRecord::from_record(record),
                    ::pgcell::Value::Null => Err(::pgcell::DecodeError::Null),
                    other => Err(::pgcell::DecodeError::TypeMismatch {
                        expected: "record",
                        found: other.kind_name(),
                    }),
                }
            }
        }
    }.into())
}

/// `#[record("name")]`
fn field_name(field: &Field) -> Result<Option<String>> {
    field
        .attrs
        .iter()
        .find(|attr|attr.path().is_ident("record"))
        .map(|attr|Ok(attr.parse_args::<LitStr>()?.value()))
        .transpose()
}
