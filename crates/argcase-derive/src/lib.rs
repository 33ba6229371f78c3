use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, LitStr, Meta, Result, Variant,
    meta::ParseNestedMeta, parse_macro_input, spanned::Spanned,
};

/// Implement `argcase::ArgCases` for an enum.
///
/// Each variant is one argument; its doc comment becomes the usage text and
/// its fields the payload. Behaviour is tuned with `#[arg(...)]`:
///
/// ```ignore
/// #[derive(ArgCases)]
/// #[arg(help_flags = "--help", help_flags = "-?")]
/// enum Args {
///     /// directory to work in.
///     #[arg(first, alt_name = "-C")]
///     WorkingDir(PathBuf),
///     /// number of jobs.
///     #[arg(equals_assignment)]
///     Jobs(u32),
///     /// push to a remote.
///     #[arg(prefix = "none")]
///     Push(ParseResults<PushArgs>),
/// }
/// ```
#[proc_macro_derive(ArgCases, attributes(arg))]
pub fn derive_arg_cases(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> Result<TokenStream2> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "ArgCases can only be derived for enums",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "ArgCases cannot be derived for generic enums",
        ));
    }

    let ident = &input.ident;
    let type_name = ident.to_string();
    let header = parse_enum_attrs(&input.attrs)?;

    let mut cases = Vec::new();
    let mut construct_arms = Vec::new();
    let mut deconstruct_arms = Vec::new();
    for (index, variant) in data.variants.iter().enumerate() {
        let variant_attrs = parse_variant_attrs(&variant.attrs)?;
        cases.push(case_descriptor(variant, &variant_attrs));
        construct_arms.push(construct_arm(index, variant));
        deconstruct_arms.push(deconstruct_arm(index, variant));
    }

    let prefix = header.prefix;
    let help_flags = (!header.help_flags.is_empty()).then(|| {
        let flags = &header.help_flags;
        quote! { .help_flags([#(#flags),*]) }
    });
    let help_description = header
        .help_description
        .map(|d| quote! { .help_description(#d) });

    let construct = if construct_arms.is_empty() {
        quote! {
            fn construct(_case: usize, _fields: ::std::vec::Vec<::argcase::Value>) -> ::std::option::Option<Self> {
                ::std::option::Option::None
            }
        }
    } else {
        quote! {
            fn construct(case: usize, fields: ::std::vec::Vec<::argcase::Value>) -> ::std::option::Option<Self> {
                let mut fields = fields.into_iter();
                let value = match case {
                    #(#construct_arms)*
                    _ => return ::std::option::Option::None,
                };
                if fields.next().is_some() {
                    return ::std::option::Option::None;
                }
                ::std::option::Option::Some(value)
            }
        }
    };
    let deconstruct = if deconstruct_arms.is_empty() {
        quote! {
            fn deconstruct(&self) -> (usize, ::std::vec::Vec<::argcase::Value>) {
                match *self {}
            }
        }
    } else {
        quote! {
            fn deconstruct(&self) -> (usize, ::std::vec::Vec<::argcase::Value>) {
                match self {
                    #(#deconstruct_arms)*
                }
            }
        }
    };

    Ok(quote! {
        impl ::argcase::ArgCases for #ident {
            fn describe() -> ::argcase::Description {
                ::argcase::Description::new::<Self>(#type_name)
                    .prefix(#prefix)
                    #help_flags
                    #help_description
                    #(.case(#cases))*
            }

            #construct

            #deconstruct
        }
    })
}

struct EnumAttrs {
    prefix: TokenStream2,
    help_flags: Vec<String>,
    help_description: Option<String>,
}

#[derive(Default)]
struct VariantAttrs {
    cli_name: Option<String>,
    alt_names: Vec<String>,
    app_settings_key: Option<String>,
    prefix: Option<TokenStream2>,
    assignment: Option<TokenStream2>,
    switches: Vec<Ident>,
}

const SWITCHES: &[&str] = &[
    "no_cli",
    "no_app_settings",
    "mandatory",
    "gather_all_sources",
    "rest",
    "first",
    "hidden",
    "print_labels",
    "csv",
    "main_command",
];

fn parse_enum_attrs(attrs: &[Attribute]) -> Result<EnumAttrs> {
    let mut out = EnumAttrs {
        prefix: quote! { ::argcase::CliPrefix::DoubleDash },
        help_flags: Vec::new(),
        help_description: None,
    };
    for attr in attrs.iter().filter(|a| a.path().is_ident("arg")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("prefix") {
                out.prefix = parse_prefix(&meta)?;
            } else if meta.path.is_ident("help_flags") {
                out.help_flags.push(string_value(&meta)?);
            } else if meta.path.is_ident("help_description") {
                out.help_description = Some(string_value(&meta)?);
            } else {
                return Err(meta.error("unsupported enum-level `arg` attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn parse_variant_attrs(attrs: &[Attribute]) -> Result<VariantAttrs> {
    let mut out = VariantAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("arg")) {
        attr.parse_nested_meta(|meta| {
            let path = &meta.path;
            if path.is_ident("cli_name") {
                out.cli_name = Some(string_value(&meta)?);
            } else if path.is_ident("alt_name") {
                out.alt_names.push(string_value(&meta)?);
            } else if path.is_ident("app_settings_key") {
                out.app_settings_key = Some(string_value(&meta)?);
            } else if path.is_ident("prefix") {
                out.prefix = Some(parse_prefix(&meta)?);
            } else if path.is_ident("equals_assignment") {
                out.assignment = Some(quote! { ::argcase::Assignment::Equals });
            } else if path.is_ident("equals_assignment_or_spaced") {
                out.assignment = Some(quote! { ::argcase::Assignment::EqualsOrSpaced });
            } else if let Some(name) = SWITCHES.iter().find(|s| path.is_ident(**s)) {
                out.switches.push(Ident::new(name, path.span()));
            } else {
                return Err(meta.error("unsupported `arg` attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn string_value(meta: &ParseNestedMeta<'_>) -> Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

fn parse_prefix(meta: &ParseNestedMeta<'_>) -> Result<TokenStream2> {
    let lit: LitStr = meta.value()?.parse()?;
    match lit.value().as_str() {
        "none" => Ok(quote! { ::argcase::CliPrefix::None }),
        "dash" => Ok(quote! { ::argcase::CliPrefix::Dash }),
        "double-dash" => Ok(quote! { ::argcase::CliPrefix::DoubleDash }),
        _ => Err(syn::Error::new(
            lit.span(),
            "expected \"none\", \"dash\" or \"double-dash\"",
        )),
    }
}

/// Doc comment lines joined into one sentence.
fn doc_string(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_names(fields: &Fields) -> Vec<String> {
    match fields {
        Fields::Unit => Vec::new(),
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => vec!["item".to_string()],
        Fields::Unnamed(unnamed) => (1..=unnamed.unnamed.len())
            .map(|i| format!("item{i}"))
            .collect(),
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.as_ref().map(Ident::to_string))
            .collect(),
    }
}

fn case_descriptor(variant: &Variant, attrs: &VariantAttrs) -> TokenStream2 {
    let identifier = variant.ident.to_string();
    let usage = doc_string(&variant.attrs);

    let fields = variant
        .fields
        .iter()
        .zip(field_names(&variant.fields))
        .map(|(field, name)| {
            let ty = &field.ty;
            quote! { .field::<#ty>(#name) }
        });

    let mut settings = Vec::new();
    if let Some(name) = &attrs.cli_name {
        settings.push(quote! { attributes.cli_name = ::std::option::Option::Some(#name.to_string()); });
    }
    for alt in &attrs.alt_names {
        settings.push(quote! { attributes.alt_cli_names.push(#alt.to_string()); });
    }
    if let Some(key) = &attrs.app_settings_key {
        settings.push(quote! { attributes.app_settings_key = ::std::option::Option::Some(#key.to_string()); });
    }
    if let Some(prefix) = &attrs.prefix {
        settings.push(quote! { attributes.prefix = ::std::option::Option::Some(#prefix); });
    }
    if let Some(assignment) = &attrs.assignment {
        settings.push(quote! { attributes.assignment = #assignment; });
    }
    for switch in &attrs.switches {
        settings.push(quote! { attributes.#switch = true; });
    }

    quote! {
        {
            #[allow(unused_mut)]
            let mut attributes = ::argcase::CaseAttributes::default();
            #(#settings)*
            ::argcase::CaseDescriptor::new(#identifier, #usage)
                #(#fields)*
                .attributes(attributes)
        }
    }
}

fn construct_arm(index: usize, variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    let take = |ty: &syn::Type| {
        quote! { <#ty as ::argcase::ArgField>::from_value(fields.next()?)? }
    };
    match &variant.fields {
        Fields::Unit => quote! { #index => Self::#ident, },
        Fields::Unnamed(unnamed) => {
            let values = unnamed.unnamed.iter().map(|f| take(&f.ty));
            quote! { #index => Self::#ident(#(#values),*), }
        }
        Fields::Named(named) => {
            let values = named.named.iter().map(|f| {
                let name = &f.ident;
                let value = take(&f.ty);
                quote! { #name: #value }
            });
            quote! { #index => Self::#ident { #(#values),* }, }
        }
    }
}

fn deconstruct_arm(index: usize, variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    match &variant.fields {
        Fields::Unit => quote! { Self::#ident => (#index, ::std::vec::Vec::new()), },
        Fields::Unnamed(unnamed) => {
            let bindings: Vec<Ident> = (0..unnamed.unnamed.len())
                .map(|i| Ident::new(&format!("field{i}"), variant.ident.span()))
                .collect();
            quote! {
                Self::#ident(#(#bindings),*) => (
                    #index,
                    ::std::vec![#(::argcase::ArgField::to_value(#bindings)),*],
                ),
            }
        }
        Fields::Named(named) => {
            let bindings: Vec<&Option<Ident>> = named.named.iter().map(|f| &f.ident).collect();
            quote! {
                Self::#ident { #(#bindings),* } => (
                    #index,
                    ::std::vec![#(::argcase::ArgField::to_value(#bindings)),*],
                ),
            }
        }
    }
}
