use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{quote, quote_spanned};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::Token;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DeriveInput, Expr, ExprLit, Ident, ItemFn,
    Lit, LitStr, Meta, Visibility,
};

/// Derive the field descriptor list the validation engine walks.
/// Usage:
/// #[derive(Record)]
/// pub struct Ad {
///   #[tag(validate = "len:20")]
///   pub title: String,
///   #[tag(validate = "len:200", json = "body")]
///   pub text: String,
/// }
///
/// Only fields declared exactly `pub` are exported. Untagged fields can be of
/// any type; tagged exported fields must implement `advalidator::Inspect`.
#[proc_macro_derive(Record, attributes(tag))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_record(input) {
        Ok(ts) => ts.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_record(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let data = match &input.data {
        Data::Struct(data) => data,
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span,
                "#[derive(Record)] only supports structs",
            ))
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "#[derive(Record)] only supports structs",
            ))
        }
    };

    let ident = &input.ident;
    let type_name = LitStr::new(&unraw(ident), ident.span());
    let mut generics = input.generics.clone();
    let generic = !generics.params.is_empty();

    let mut entries = Vec::with_capacity(data.fields.len());
    for (index, field) in data.fields.iter().enumerate() {
        let (name, access) = match &field.ident {
            Some(id) => (unraw(id), quote!(#id)),
            None => {
                let idx = syn::Index::from(index);
                (index.to_string(), quote!(#idx))
            }
        };
        let tags = parse_tags(&field.attrs)?;
        let exported = matches!(field.vis, Visibility::Public(_));

        let value = if !exported {
            quote!(::core::option::Option::None)
        } else if tags.is_empty() {
            quote!(::core::option::Option::Some(::advalidator::Value::Other(
                ::advalidator::Kind::Opaque
            )))
        } else {
            let ty = &field.ty;
            if generic {
                generics
                    .make_where_clause()
                    .predicates
                    .push(parse_quote!(#ty: ::advalidator::Inspect));
            }
            quote_spanned! {ty.span()=>
                ::core::option::Option::Some(::advalidator::Inspect::inspect(&self.#access))
            }
        };

        let name_lit = LitStr::new(&name, Span::call_site());
        let keys = tags.iter().map(|(k, _)| LitStr::new(k, Span::call_site()));
        let vals = tags.iter().map(|(_, v)| LitStr::new(v, Span::call_site()));
        entries.push(quote! {
            ::advalidator::Field {
                name: #name_lit,
                exported: #exported,
                tags: ::advalidator::Tags::new(&[ #( (#keys, #vals) ),* ]),
                value: #value,
            }
        });
    }

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::advalidator::Inspect for #ident #ty_generics #where_clause {
            fn inspect(&self) -> ::advalidator::Value<'_> {
                ::advalidator::Value::Record(self)
            }
        }

        impl #impl_generics ::advalidator::Record for #ident #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn fields(&self) -> ::std::vec::Vec<::advalidator::Field<'_>> {
                ::std::vec![ #( #entries ),* ]
            }
        }
    })
}

/// Collect `key = "value"` pairs from every `#[tag(...)]` attribute in order.
fn parse_tags(attrs: &[Attribute]) -> syn::Result<Vec<(String, String)>> {
    let mut tags = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("tag")) {
        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .map(unraw)
                .ok_or_else(|| meta.error("tag keys must be plain identifiers"))?;
            let value: LitStr = meta.value()?.parse()?;
            tags.push((key, value.value()));
            Ok(())
        })?;
    }
    Ok(tags)
}

fn unraw(ident: &Ident) -> String {
    let s = ident.to_string();
    match s.strip_prefix("r#") {
        Some(stripped) => stripped.to_string(),
        None => s,
    }
}

/// Register a function as an additional rule kind for every default engine.
/// Usage:
/// #[validation_rule(kind = "prefix")]
/// fn prefix(arg: &str, value: &Value<'_>) -> Result<(), RuleError> { ... }
#[proc_macro_attribute]
pub fn validation_rule(attr: TokenStream, item: TokenStream) -> TokenStream {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated
        .parse(attr)
        .unwrap_or_default();
    let input_fn = parse_macro_input!(item as ItemFn);

    let mut kind: Option<String> = None;
    for m in metas {
        if let Meta::NameValue(nv) = m {
            if nv.path.is_ident("kind") {
                if let Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) = &nv.value
                {
                    kind = Some(s.value());
                }
            }
        }
    }

    // Kinds are matched against the text before the first ':' of a rule expression.
    let mut preamble = proc_macro2::TokenStream::new();
    match kind.as_deref() {
        None | Some("") => {
            preamble.extend(
                quote! { compile_error!("#[validation_rule] requires a non-empty kind=\"...\""); },
            );
        }
        Some(k) if k.contains(':') || k.contains(char::is_whitespace) => {
            preamble.extend(
                quote! { compile_error!("validation_rule kind must not contain ':' or whitespace"); },
            );
        }
        _ => {}
    }

    let kind_lit = LitStr::new(kind.as_deref().unwrap_or(""), Span::call_site());
    let fn_ident = &input_fn.sig.ident;
    let gen = quote! {
        #preamble
        #input_fn
        ::advalidator::inventory::submit! {
            ::advalidator::RuleRegistration {
                kind: #kind_lit,
                check: #fn_ident,
            }
        }
    };
    gen.into()
}
