/// Builds a URL slug from a tag name: Cyrillic is transliterated to Latin,
/// everything is lowercased and runs of other characters collapse into `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        let latin = transliterate(c);

        match latin {
            Some(part) if !part.is_empty() => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push_str(part);
            }
            // hard and soft signs vanish without splitting the word
            Some(_) => {}
            None if c.is_ascii_alphanumeric() => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            }
            None => pending_dash = true,
        }
    }

    slug
}

fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "i",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' => "",
        'ы' => "y",
        'ь' => "",
        'э' => "e",
        'ю' => "iu",
        'я' => "ia",
        _ => return None,
    };

    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn transliterates_cyrillic() {
        assert_eq!(slugify("Завтрак"), "zavtrak");
        assert_eq!(slugify("Обед"), "obed");
        assert_eq!(slugify("Щи"), "shchi");
    }

    #[test]
    fn separators_collapse_into_single_dash() {
        assert_eq!(slugify("Поздний  ужин!"), "pozdnii-uzhin");
        assert_eq!(slugify("  --Brunch & Co--  "), "brunch-co");
    }

    #[test]
    fn soft_sign_does_not_split_words() {
        assert_eq!(slugify("Сельдь"), "seld");
        assert_eq!(slugify("Подъезд"), "podezd");
    }

    #[test]
    fn latin_and_digits_pass_through() {
        assert_eq!(slugify("Top 10 Recipes"), "top-10-recipes");
    }

    #[test]
    fn empty_input_gives_empty_slug() {
        assert_eq!(slugify("!!!"), "");
    }
}
