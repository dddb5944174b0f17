use crate::types::Direction;

pub const KEY_CODES: [(&str, Direction); 4] = [
    ("ArrowUp", Direction::Up),
    ("ArrowRight", Direction::Right),
    ("ArrowDown", Direction::Down),
    ("ArrowLeft", Direction::Left),
];

/// Decodes raw key codes into moves. Anything unrecognized maps to `None`
/// and must never reach the engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputMapper;

impl InputMapper {
    pub fn map_input(&self, raw_code: &str) -> Option<Direction> {
        KEY_CODES
            .iter()
            .find(|(code, _)| *code == raw_code)
            .map(|(_, direction)| *direction)
    }

    pub fn is_allowed(&self, raw_code: &str) -> bool {
        self.map_input(raw_code).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_codes_map_to_directions() {
        let mapper = InputMapper;
        assert_eq!(mapper.map_input("ArrowUp"), Some(Direction::Up));
        assert_eq!(mapper.map_input("ArrowRight"), Some(Direction::Right));
        assert_eq!(mapper.map_input("ArrowDown"), Some(Direction::Down));
        assert_eq!(mapper.map_input("ArrowLeft"), Some(Direction::Left));
    }

    #[test]
    fn other_codes_are_filtered() {
        let mapper = InputMapper;
        for code in ["", "KeyW", "Space", "arrowup", "ARROWLEFT", " ArrowUp", "up"] {
            assert_eq!(mapper.map_input(code), None, "code {code:?} should be ignored");
            assert!(!mapper.is_allowed(code));
        }
    }
}
