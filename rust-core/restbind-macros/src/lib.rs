//! # `RestBind` Macros
//!
//! Procedural macros for declaring restbind handlers on plain functions.
//!
//! ## Usage
//!
//! ```ignore
//! use restbind_macros::route;
//!
//! #[route(GET, "search?q={query}&page={page}", description = "Full-text search", example = "search?q=rust")]
//! fn search(query: String, #[default(1)] page: i64) -> Result<Vec<String>, String> {
//!     // ...
//! }
//!
//! let (descriptor, handler) = search_route();
//! service.route(descriptor, handler)?;
//! ```

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::{
    parse_macro_input, Attribute, Expr, FnArg, Ident, ItemFn, Lit, LitBool, LitStr, Pat, Token,
    Type,
};

/// Arguments of `#[route(...)]`
struct RouteArgs {
    verb: Ident,
    template: LitStr,
    description: Option<LitStr>,
    example: Option<LitStr>,
    describe: Option<LitBool>,
}

impl Parse for RouteArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let verb: Ident = input.parse()?;
        input.parse::<Token![,]>()?;
        let template: LitStr = input.parse()?;

        let mut args = Self {
            verb,
            template,
            description: None,
            example: None,
            describe: None,
        };

        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            match key.to_string().as_str() {
                "description" => args.description = Some(input.parse()?),
                "example" => args.example = Some(input.parse()?),
                "describe" => args.describe = Some(input.parse()?),
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown route option `{other}`"),
                    ))
                }
            }
        }

        Ok(args)
    }
}

/// One handler parameter after its binding attributes were stripped
struct RouteParam {
    name: Ident,
    ty: Type,
    document: bool,
    default: Option<Expr>,
}

fn verb_path(verb: &Ident) -> syn::Result<TokenStream2> {
    let variant = match verb.to_string().to_ascii_uppercase().as_str() {
        "GET" => quote!(Get),
        "POST" => quote!(Post),
        "PUT" => quote!(Put),
        "DELETE" => quote!(Delete),
        "PATCH" => quote!(Patch),
        "HEAD" => quote!(Head),
        "OPTIONS" => quote!(Options),
        other => {
            return Err(syn::Error::new(
                verb.span(),
                format!("unsupported HTTP verb `{other}`"),
            ))
        }
    };
    Ok(quote!(::restbind_core::Verb::#variant))
}

/// Remove `#[document]` and `#[default(..)]`, returning what they declared
fn take_binding_attrs(attrs: &mut Vec<Attribute>) -> syn::Result<(bool, Option<Expr>)> {
    let mut document = false;
    let mut default = None;
    let mut kept = Vec::with_capacity(attrs.len());

    for attr in attrs.drain(..) {
        if attr.path().is_ident("document") {
            attr.meta.require_path_only()?;
            document = true;
        } else if attr.path().is_ident("default") {
            default = Some(attr.parse_args::<Expr>()?);
        } else {
            kept.push(attr);
        }
    }

    *attrs = kept;
    Ok((document, default))
}

fn collect_params(func: &mut ItemFn) -> syn::Result<Vec<RouteParam>> {
    let mut params = Vec::new();

    for input in &mut func.sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            return Err(syn::Error::new_spanned(
                input,
                "#[route] handlers must be free functions",
            ));
        };
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "#[route] parameters must be plain identifiers",
            ));
        };

        let (document, default) = take_binding_attrs(&mut pat_type.attrs)?;
        if document && default.is_some() {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "a #[document] parameter cannot have a #[default]",
            ));
        }

        params.push(RouteParam {
            name: pat_ident.ident.clone(),
            ty: (*pat_type.ty).clone(),
            document,
            default,
        });
    }

    Ok(params)
}

fn param_spec(param: &RouteParam) -> TokenStream2 {
    let RouteParam { name, ty, .. } = param;
    let name_str = LitStr::new(&name.to_string(), Span::call_site());

    if param.document {
        return quote!(::restbind_core::ParamSpec::document(#name_str));
    }

    let spec = quote! {
        ::restbind_core::ParamSpec::query(
            #name_str,
            <#ty as ::restbind_core::FromParamValue>::PARAM_TYPE,
        )
    };

    match &param.default {
        Some(expr) => {
            let value = match expr {
                Expr::Lit(lit) if matches!(lit.lit, Lit::Str(_)) => {
                    quote!(::core::convert::Into::into(#expr))
                }
                _ => quote!(#expr),
            };
            quote! {
                #spec.with_default({
                    let value: #ty = #value;
                    ::restbind_core::ParamValue::from(value)
                })
            }
        }
        None => quote! {
            {
                let spec = #spec;
                if <#ty as ::restbind_core::FromParamValue>::OPTIONAL {
                    spec.with_default(::restbind_core::ParamValue::Null)
                } else {
                    spec
                }
            }
        },
    }
}

fn expand(args: RouteArgs, mut func: ItemFn) -> syn::Result<TokenStream2> {
    if func.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            func.sig.asyncness,
            "#[route] handlers must be synchronous",
        ));
    }
    if !func.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.generics,
            "#[route] handlers cannot be generic",
        ));
    }

    let params = collect_params(&mut func)?;
    let verb = verb_path(&args.verb)?;
    let template = &args.template;
    let fn_name = &func.sig.ident;
    let vis = &func.vis;
    let route_fn = format_ident!("{}_route", fn_name);

    let specs = params.iter().map(param_spec);
    let extracts = params.iter().enumerate().map(|(position, p)| {
        let ty = &p.ty;
        quote!(args.extract::<#ty>(#position)?)
    });

    let description = args
        .description
        .map(|d| quote!(let builder = builder.description(#d);));
    let example = args
        .example
        .map(|e| quote!(let builder = builder.example(#e);));
    let describe = args
        .describe
        .map(|d| quote!(let builder = builder.describe(#d);));

    let doc = format!("Route declaration for [`{fn_name}`]");

    Ok(quote! {
        #func

        #[doc = #doc]
        #vis fn #route_fn() -> (::restbind_core::HandlerDescriptor, ::restbind_core::Handler) {
            let builder = ::restbind_core::HandlerDescriptor::builder(
                #verb,
                #template,
                ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#fn_name)),
            )
            #(.param(#specs))*;
            #description
            #example
            #describe

            let handler = ::restbind_core::handler(|args: &::restbind_core::BoundArguments| {
                let _ = args;
                ::restbind_core::IntoHandlerResult::into_handler_result(#fn_name(#(#extracts),*))
            });

            (builder.build(), handler)
        }
    })
}

/// Declare a function as a restbind handler
///
/// Generates `<name>_route() -> (HandlerDescriptor, Handler)` next to the
/// function. Parameters bind by name to the template's placeholders;
/// `#[default(expr)]` makes a query parameter optional and `#[document]`
/// binds the posted JSON document.
///
/// # Usage
///
/// ```ignore
/// #[route(POST, "items?id={item_id}", describe = false)]
/// fn update(#[default(0)] item_id: i64, #[document] item: serde_json::Value) -> Result<u64, String> {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn route(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as RouteArgs);
    let func = parse_macro_input!(item as ItemFn);

    expand(args, func)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
