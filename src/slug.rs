use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9]+").expect("static slug pattern is valid")
});

/// Lowercase, hyphen-separated identifier derived from a display name.
///
/// Runs of anything that is not an ASCII letter or digit collapse into a
/// single hyphen; leading and trailing hyphens are dropped. Common Latin
/// diacritics are folded to their base letter first so that "Énergie" and
/// "Energie" share a slug.
pub fn slugify(value: &str) -> String {
    let folded: String = value
        .trim()
        .chars()
        .flat_map(|ch| fold_char(ch).to_lowercase())
        .collect();
    NON_ALNUM
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

fn fold_char(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'ç' | 'Ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'i',
        'ñ' | 'Ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
        'ý' | 'ÿ' | 'Ý' => 'y',
        other => other,
    }
}
