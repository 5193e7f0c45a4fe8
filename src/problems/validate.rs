/// Cities the system covers. Closed world, never free text.
pub const CITIES: [&str; 2] = ["Chimoio", "Beira"];

/// Problem categories shown on the map.
pub const CATEGORIES: [&str; 6] = [
    "Buraco na Rua",
    "Vazamento de Água",
    "Acúmulo de Lixo",
    "Falha na Iluminação",
    "Rua Não Transitável",
    "Outros",
];

pub fn is_known_city(city: &str) -> bool {
    CITIES.contains(&city)
}

pub fn is_known_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

/// Escape HTML-significant characters before storage. Defense in depth:
/// consumers are still expected to encode on output.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn validate_title(title: &str) -> Result<(), String> {
    let len = title.chars().count();
    if !(5..=100).contains(&len) {
        return Err("Title must be between 5 and 100 characters".into());
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), String> {
    if description.chars().count() < 10 {
        return Err("Description must be at least 10 characters".into());
    }
    Ok(())
}

pub fn validate_category(category: &str) -> Result<(), String> {
    if !is_known_category(category) {
        return Err(format!("Unknown category: {category}"));
    }
    Ok(())
}

pub fn validate_city(city: &str) -> Result<(), String> {
    if !is_known_city(city) {
        return Err("City must be Chimoio or Beira".into());
    }
    Ok(())
}

/// Parse and range-check coordinates submitted as multipart text fields.
pub fn validate_coords(latitude: &str, longitude: &str) -> Result<(f64, f64), String> {
    let lat: f64 = latitude
        .trim()
        .parse()
        .map_err(|_| "Latitude must be a number".to_string())?;
    let lng: f64 = longitude
        .trim()
        .parse()
        .map_err(|_| "Longitude must be a number".to_string())?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err("Latitude must be between -90 and 90".into());
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err("Longitude must be between -180 and 180".into());
    }
    Ok((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_escapes_markup_characters() {
        assert_eq!(
            sanitize_text(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;&#x2F;script&gt;"
        );
        assert_eq!(sanitize_text("O'Neill"), "O&#x27;Neill");
        assert_eq!(sanitize_text("plain text, à vontade"), "plain text, à vontade");
    }

    #[test]
    fn title_bounds() {
        assert!(validate_title("1234").is_err());
        assert!(validate_title("12345").is_ok());
        assert!(validate_title(&"a".repeat(100)).is_ok());
        assert!(validate_title(&"a".repeat(101)).is_err());
    }

    #[test]
    fn description_minimum() {
        assert!(validate_description("too short").is_err());
        assert!(validate_description("long enough description").is_ok());
    }

    #[test]
    fn closed_city_and_category_sets() {
        assert!(validate_city("Chimoio").is_ok());
        assert!(validate_city("Beira").is_ok());
        assert!(validate_city("Maputo").is_err());
        assert!(validate_category("Buraco na Rua").is_ok());
        assert!(validate_category("Qualquer Coisa").is_err());
    }

    #[test]
    fn coordinate_ranges() {
        assert_eq!(validate_coords("-19.1", "33.48").unwrap(), (-19.1, 33.48));
        assert!(validate_coords("200", "33.48").is_err());
        assert!(validate_coords("-19.1", "181").is_err());
        assert!(validate_coords("abc", "33.48").is_err());
        assert!(validate_coords("", "").is_err());
    }
}
