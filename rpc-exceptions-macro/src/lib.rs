use proc_macro::TokenStream;

mod catch;

/// Attribute macro declaring which exception kinds a filter catches
///
/// Generates a `CatchKinds` implementation for the annotated struct. Kinds may be
/// written as bare identifiers or string literals. With no arguments the filter is
/// a wildcard and catches every exception.
///
/// # Example
/// ```rust,ignore
/// use rpc_exceptions::catch;
///
/// #[catch(RpcException, "ValidationError")]
/// pub struct ValidationFilter;
///
/// #[catch]
/// pub struct CatchEverything;
/// ```
#[proc_macro_attribute]
pub fn catch(attr: TokenStream, item: TokenStream) -> TokenStream {
    catch::catch_attribute(attr, item)
}
