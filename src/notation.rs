//! Text-level canonicalization of the external notation: Greek-letter
//! transliteration, named-constant substitution, exponent-suffix rewriting,
//! and the positional symbol table.

/// Unicode letter name for one Greek code point, plus whether it is a
/// capital. Lambda deliberately maps to `lam` (the established short form in
/// the expression files), not the Unicode spelling.
fn greek_base(ch: char) -> Option<(&'static str, bool)> {
    let (name, capital) = match ch {
        'α' => ("alpha", false),
        'β' => ("beta", false),
        'γ' => ("gamma", false),
        'δ' => ("delta", false),
        'ε' => ("epsilon", false),
        'ζ' => ("zeta", false),
        'η' => ("eta", false),
        'θ' => ("theta", false),
        'ι' => ("iota", false),
        'κ' => ("kappa", false),
        'λ' => ("lam", false),
        'μ' => ("mu", false),
        'ν' => ("nu", false),
        'ξ' => ("xi", false),
        'ο' => ("omicron", false),
        'π' => ("pi", false),
        'ρ' => ("rho", false),
        'ς' | 'σ' => ("sigma", false),
        'τ' => ("tau", false),
        'υ' => ("upsilon", false),
        'φ' => ("phi", false),
        'χ' => ("chi", false),
        'ψ' => ("psi", false),
        'ω' => ("omega", false),
        'Α' => ("alpha", true),
        'Β' => ("beta", true),
        'Γ' => ("gamma", true),
        'Δ' => ("delta", true),
        'Ε' => ("epsilon", true),
        'Ζ' => ("zeta", true),
        'Η' => ("eta", true),
        'Θ' => ("theta", true),
        'Ι' => ("iota", true),
        'Κ' => ("kappa", true),
        'Λ' => ("lam", true),
        'Μ' => ("mu", true),
        'Ν' => ("nu", true),
        'Ξ' => ("xi", true),
        'Ο' => ("omicron", true),
        'Π' => ("pi", true),
        'Ρ' => ("rho", true),
        'Σ' => ("sigma", true),
        'Τ' => ("tau", true),
        'Υ' => ("upsilon", true),
        'Φ' => ("phi", true),
        'Χ' => ("chi", true),
        'Ψ' => ("psi", true),
        'Ω' => ("omega", true),
        _ => return None,
    };
    Some((name, capital))
}

/// Replace every Greek code point with its transliterated letter name:
/// small letters lowercase, capital letters Capitalized. Must run before
/// parsing — the algebra grammar only accepts Latin identifiers.
pub fn replace_greek_symbols(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match greek_base(ch) {
            Some((name, false)) => out.push_str(name),
            Some((name, true)) => {
                let mut chars = name.chars();
                if let Some(first) = chars.next() {
                    out.push(first.to_ascii_uppercase());
                    out.push_str(chars.as_str());
                }
            }
            None => out.push(ch),
        }
    }
    out
}

/// Substitute the named mathematical constants with their decimal literals.
pub fn replace_symbol_constants(text: &str) -> String {
    text.replace("Pi", "3.141592653589793")
        .replace("EulerGamma", "0.5772156649015329")
        .replace("Glaisher", "1.28242712910062")
}

/// Rewrite the squared-exponent marker as a textual suffix so identifiers
/// like `mu3^2` become valid names (`mu3sq`).
///
/// This is a literal substring replace, not position-aware: `^2` anywhere in
/// the string is rewritten, so `^2myVar` becomes `sqmyVar`. Established
/// behavior, kept for compatibility with existing symbol lists.
pub fn remove_suffices(text: &str) -> String {
    text.replace("^2", "sq")
}

/// An ordered table of canonicalized symbol names defining the positional
/// `params[i]` indices used by every generated module.
///
/// Names are transliterated at construction and sorted longest-first (length
/// descending, then lexically descending) so that substituting a name never
/// corrupts a longer name it prefixes: `lam23p` is replaced before `lam23`.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    names: Vec<String>,
}

impl SymbolTable {
    pub fn new(raw_names: &[String]) -> Result<SymbolTable, String> {
        let mut names: Vec<String> = raw_names
            .iter()
            .map(|name| replace_greek_symbols(name))
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| b.cmp(a)));

        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                return Err(format!("duplicate symbol '{}' in symbol table", pair[0]));
            }
        }
        Ok(SymbolTable { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Textually replace every occurrence of each symbol name with its
    /// positional `params[i]` reference. Greek transliteration is reapplied
    /// first so raw and canonical spellings both resolve.
    pub fn substitute(&self, expression: &str) -> String {
        let mut expression = replace_greek_symbols(expression);
        for (idx, name) in self.names.iter().enumerate() {
            expression = expression.replace(name.as_str(), &format!("params[{}]", idx));
        }
        expression
    }
}
