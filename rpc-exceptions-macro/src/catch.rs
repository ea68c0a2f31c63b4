use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Expr, ExprLit, ExprPath, ItemStruct, Lit, Token};

pub fn catch_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let kinds = parse_macro_input!(attr with Punctuated::<Expr, Token![,]>::parse_terminated);
    let input = parse_macro_input!(item as ItemStruct);

    let mut names = Vec::with_capacity(kinds.len());
    for kind in &kinds {
        match kind_name(kind) {
            Some(name) => names.push(name),
            None => {
                return syn::Error::new_spanned(
                    kind,
                    "expected an exception kind identifier or string literal",
                )
                .to_compile_error()
                .into();
            }
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        #input

        impl #impl_generics ::rpc_exceptions::exception::CatchKinds for #name #ty_generics #where_clause {
            fn exception_kinds() -> ::std::vec::Vec<::rpc_exceptions::exception::ExceptionKind> {
                ::std::vec![
                    #( ::rpc_exceptions::exception::ExceptionKind::new(#names) ),*
                ]
            }
        }
    }
    .into()
}

/// `TypeError` and `"TypeError"` both name the kind `TypeError`; for paths the last
/// segment is used.
fn kind_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Path(ExprPath { path, .. }) => path.segments.last().map(|s| s.ident.to_string()),
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => Some(lit.value()),
        _ => None,
    }
}
