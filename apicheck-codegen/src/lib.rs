use proc_macro::TokenStream;
use quote::quote;
use quote::quote_spanned;
use syn::spanned::Spanned;

/// Turns an `async fn` into a `#[test]` driven by `apicheck::run_test`.
///
/// The body may evaluate to `()` or to `Result<(), E>` with `E: Display`.
/// `#[api_test(live)]` additionally marks the test `#[ignore]`, for tests
/// that need the real server.
#[proc_macro_attribute]
pub fn api_test(attrs: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemFn);
    let args = syn::parse_macro_input!(attrs as syn::AttributeArgs);

    let live = match parse_live(&args) {
        Ok(live) => live,
        Err(stream) => return stream.into(),
    };

    let signature = &input.sig;

    if signature.asyncness.is_none() {
        return quote_spanned! {signature.fn_token.span()=>
            compile_error!("api_test can only be applied to an async fn");
        }
        .into();
    }

    if !signature.inputs.is_empty() {
        return quote_spanned! {signature.inputs.span()=>
            compile_error!("api_test functions take no arguments");
        }
        .into();
    }

    let name = &signature.ident;
    let attributes = &input.attrs;
    let visibility = &input.vis;
    let block = &input.block;
    let return_type = &signature.output;

    let ignore = if live {
        quote! { #[ignore = "needs a running API server, see the URL variable"] }
    } else {
        quote! {}
    };

    let output = quote! {
        #[test]
        #ignore
        #(#attributes)*
        #visibility fn #name() {
            async fn __apicheck_body() #return_type #block

            apicheck::run_test(stringify!(#name), __apicheck_body());
        }
    };

    TokenStream::from(output)
}

fn parse_live(args: &[syn::NestedMeta]) -> Result<bool, proc_macro2::TokenStream> {
    match args {
        [] => Ok(false),
        [syn::NestedMeta::Meta(syn::Meta::Path(path))] if path.is_ident("live") => Ok(true),
        [other, ..] => Err(quote_spanned! {other.span()=>
            compile_error!("The only accepted argument is `live`");
        }),
    }
}
