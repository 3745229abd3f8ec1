use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{
    parse_macro_input, Expr, ExprLit, ExprUnary, FnArg, Ident, ItemFn, Lit, Meta, MetaNameValue,
    Pat, PathArguments, Token, Type, UnOp,
};

/// Parsed `#[memoized(...)]` options.
struct MemoizedAttributes {
    /// Expression evaluating to a `recall::MaxSize`.
    maxsize: TokenStream2,
    typed: bool,
    custom_name: Option<String>,
}

impl Default for MemoizedAttributes {
    fn default() -> Self {
        Self {
            maxsize: quote! { ::recall::MaxSize::Bounded(::recall::DEFAULT_MAXSIZE) },
            typed: false,
            custom_name: None,
        }
    }
}

fn parse_attributes(attr: TokenStream2) -> syn::Result<MemoizedAttributes> {
    let mut attrs = MemoizedAttributes::default();
    if attr.is_empty() {
        return Ok(attrs);
    }

    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(attr)?;
    for meta in metas {
        if meta.path().is_ident("maxsize") {
            match &meta {
                Meta::NameValue(nv) => attrs.maxsize = parse_maxsize_value(nv)?,
                _ => {
                    return Err(syn::Error::new_spanned(
                        &meta,
                        "expected `maxsize = <integer>` or `maxsize = \"unbounded\"`",
                    ))
                }
            }
        } else if meta.path().is_ident("unbounded") {
            match &meta {
                Meta::Path(_) => attrs.maxsize = quote! { ::recall::MaxSize::Unbounded },
                _ => {
                    return Err(syn::Error::new_spanned(&meta, "`unbounded` takes no value"));
                }
            }
        } else if meta.path().is_ident("typed") {
            match &meta {
                Meta::Path(_) => attrs.typed = true,
                Meta::NameValue(MetaNameValue {
                    value:
                        Expr::Lit(ExprLit {
                            lit: Lit::Bool(flag),
                            ..
                        }),
                    ..
                }) => attrs.typed = flag.value(),
                _ => {
                    return Err(syn::Error::new_spanned(
                        &meta,
                        "expected `typed` or `typed = <bool>`",
                    ))
                }
            }
        } else if meta.path().is_ident("name") {
            match &meta {
                Meta::NameValue(MetaNameValue {
                    value:
                        Expr::Lit(ExprLit {
                            lit: Lit::Str(name),
                            ..
                        }),
                    ..
                }) => attrs.custom_name = Some(name.value()),
                _ => {
                    return Err(syn::Error::new_spanned(&meta, "expected `name = \"...\"`"));
                }
            }
        } else {
            return Err(syn::Error::new_spanned(
                &meta,
                "invalid cache configuration: expected `maxsize`, `unbounded`, `typed`, or `name`",
            ));
        }
    }
    Ok(attrs)
}

fn parse_maxsize_value(nv: &MetaNameValue) -> syn::Result<TokenStream2> {
    match &nv.value {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => {
            let value = int.base10_parse::<usize>()?;
            Ok(quote! { ::recall::MaxSize::Bounded(#value) })
        }
        Expr::Lit(ExprLit {
            lit: Lit::Str(text),
            ..
        }) => {
            let value = text.value();
            if value.eq_ignore_ascii_case("unbounded") || value.eq_ignore_ascii_case("none") {
                Ok(quote! { ::recall::MaxSize::Unbounded })
            } else if let Ok(n) = value.trim().parse::<usize>() {
                Ok(quote! { ::recall::MaxSize::Bounded(#n) })
            } else {
                Err(syn::Error::new_spanned(
                    text,
                    "invalid cache configuration: maxsize must be an integer or \"unbounded\"",
                ))
            }
        }
        // A negative maxsize asks for a disabled cache.
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) if matches!(
            &**expr,
            Expr::Lit(ExprLit {
                lit: Lit::Int(_),
                ..
            })
        ) =>
        {
            Ok(quote! { ::recall::MaxSize::Bounded(0) })
        }
        other => Err(syn::Error::new_spanned(
            other,
            "invalid cache configuration: maxsize must be an integer or \"unbounded\"",
        )),
    }
}

/// Returns the `Ok` type when `ty` is syntactically a `Result`.
fn extract_result_ok_type(ty: &Type) -> Option<Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(ok) => Some(ok.clone()),
        _ => None,
    })
}

/// Memoizes an `async fn` behind a bounded LRU cache.
///
/// The transformed function keeps its signature. Each call canonicalizes the
/// arguments into a cache key; a call with a key seen before returns the
/// cached result without running the body, otherwise the body runs (this is
/// the only `.await`ed region the wrapper adds) and its result is stored.
/// When the cache is full the least recently used entry makes room.
///
/// # Requirements
///
/// - **The function must be `async`** and a free function (no `self`).
/// - **Arguments** must implement `recall::KeyArg` (integers, floats, bools,
///   chars, strings, options, slices/`Vec`s and small tuples of these).
/// - **The return type** must implement `Clone`; for `Result` return types
///   only the `Ok` type is stored.
///
/// # Options
///
/// - `maxsize`: capacity of the LRU cache (default: `128`). `0` disables
///   storage entirely — every call recomputes and only the miss counter
///   moves. `maxsize = "unbounded"` (or the bare `unbounded` flag) removes
///   the bound and with it all eviction bookkeeping.
/// - `typed`: when set, the runtime types of the arguments join the key, so
///   calls differing only in argument type are cached separately.
/// - `name`: custom registry identifier (default: the function name).
///
/// # Cache behavior
///
/// - **Shared**: one cache per function, shared across all tasks and threads.
/// - **`Result` returns**: only `Ok` values are cached; an `Err` propagates
///   unchanged, counts as a miss, and is recomputed on the next call.
/// - **Races**: concurrent calls with the same key may each run the body;
///   the first finished insertion wins and the cache keeps a single entry.
/// - **Statistics**: the cache registers itself in `recall::registry` on the
///   first call, under the function name or the `name` option.
///
/// # Examples
///
/// ```ignore
/// use recall::memoized;
///
/// #[memoized(maxsize = 256)]
/// async fn fetch_user(id: u64) -> User {
///     database::fetch_user(id).await
/// }
///
/// // Statistics and reset, by name:
/// let info = recall::registry::info("fetch_user").unwrap();
/// println!("{} hits, {} misses", info.hits, info.misses);
/// recall::registry::reset("fetch_user");
/// ```
///
/// ```ignore
/// use recall::memoized;
///
/// // Only Ok responses are cached; errors are retried on the next call.
/// #[memoized(maxsize = 50, name = "weather")]
/// async fn fetch_weather(city: String) -> Result<Weather, ApiError> {
///     api::get_weather(&city).await
/// }
/// ```
///
/// # Panics
///
/// The generated wrapper panics if an argument cannot form a cache key (a
/// `NaN` float); every other failure mode is either a compile error or the
/// wrapped function's own.
#[proc_macro_attribute]
pub fn memoized(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let attrs = match parse_attributes(attr.into()) {
        Ok(attrs) => attrs,
        Err(err) => return err.into_compile_error().into(),
    };
    match expand(&input, &attrs) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

fn expand(input: &ItemFn, attrs: &MemoizedAttributes) -> syn::Result<TokenStream2> {
    let fn_attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name = &sig.ident;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &sig.fn_token,
            "`#[memoized]` requires an `async fn`",
        ));
    }

    // Collect argument identifiers for key construction
    let mut arg_idents = Vec::new();
    for arg in &sig.inputs {
        match arg {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "`#[memoized]` does not support methods; wrap a free async fn instead",
                ));
            }
            FnArg::Typed(pat_type) => match &*pat_type.pat {
                Pat::Ident(pat_ident) => arg_idents.push(pat_ident.ident.clone()),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "`#[memoized]` arguments must be plain identifiers",
                    ));
                }
            },
        }
    }

    let ret_type: Type = match &sig.output {
        syn::ReturnType::Default => syn::parse_quote! { () },
        syn::ReturnType::Type(_, ty) => (**ty).clone(),
    };

    let fn_name_string = fn_name.to_string();
    let cache_name = attrs.custom_name.clone().unwrap_or(fn_name_string.clone());

    // Generate identifiers for the cache components
    let cache_ident = Ident::new(
        &format!("__RECALL_CACHE_{}", fn_name_string.to_uppercase()),
        fn_name.span(),
    );
    let registered_ident = Ident::new(
        &format!("__RECALL_REGISTERED_{}", fn_name_string.to_uppercase()),
        fn_name.span(),
    );

    let maxsize_expr = &attrs.maxsize;
    let typed = attrs.typed;

    // Only Ok values of Result-returning functions are cached
    let (value_type, call_expr) = match extract_result_ok_type(&ret_type) {
        Some(ok_type) => (
            quote! { #ok_type },
            quote! { #cache_ident.try_get_or_compute(__recall_key, move || async move #block).await },
        ),
        None => (
            quote! { #ret_type },
            quote! { #cache_ident.get_or_compute(__recall_key, move || async move #block).await },
        ),
    };

    let expanded = quote! {
        #(#fn_attrs)*
        #vis #sig {
            static #cache_ident: ::recall::once_cell::sync::Lazy<
                ::recall::MemoCache<::recall::Key, #value_type>,
            > = ::recall::once_cell::sync::Lazy::new(|| {
                ::recall::MemoCache::builder()
                    .maxsize(#maxsize_expr)
                    .typed(#typed)
                    .name(#cache_name)
                    .build()
            });

            // Register in the global registry (happens once on first call)
            static #registered_ident: ::recall::once_cell::sync::OnceCell<()> =
                ::recall::once_cell::sync::OnceCell::new();
            #registered_ident.get_or_init(|| {
                ::recall::registry::register(#cache_name, &*#cache_ident);
            });

            // Canonicalize the arguments before the body can consume them
            let __recall_key = {
                #[allow(unused_mut)]
                let mut __recall_builder = ::recall::KeyBuilder::new(#typed);
                #( __recall_builder.positional(&#arg_idents); )*
                __recall_builder.finish()
            };
            let __recall_key = match __recall_key {
                Ok(key) => key,
                Err(err) => panic!("memoized `{}`: {}", #cache_name, err),
            };

            #call_expr
        }
    };

    Ok(expanded)
}
