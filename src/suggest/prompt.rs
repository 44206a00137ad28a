//! Prompt construction and reply cleaning for LLM suggesters.

use crate::engine::board::Board;
use crate::engine::types::Color;

use super::types::SuggestRequest;

/// System instruction shared by every LLM suggester.
pub const SYSTEM_PROMPT: &str = "You are a chess engine playing a real game. \
Respond only with a single move in standard algebraic notation \
(e.g. e4, Nf3, exd5, O-O, e8=Q). Do not add any other text, explanations, or analysis.";

/// Build the user message for `req`.
pub fn build_prompt(req: &SuggestRequest) -> String {
    let side = match req.side_to_move {
        Color::White => "White",
        Color::Black => "Black",
    };
    let check = if req.is_check { "in check" } else { "not in check" };
    let history = if req.move_history.is_empty() {
        "none".to_string()
    } else {
        req.move_history.join(" ")
    };

    let mut prompt = format!(
        "You are a {elo} elo chess player playing {side}.\n\
         It is move {number} with the committed moves: {history}.\n\
         You are {check}.\n",
        elo = req.elo_skill,
        number = req.move_history.len() + 1,
    );

    if !req.fen.is_empty() {
        prompt.push_str(&format!("\nPosition (FEN): {}\n", req.fen));
        // Drawn from the mover's side so their pieces sit at the bottom.
        let placement = req.fen.split_whitespace().next().unwrap_or_default();
        if let Ok(board) = Board::from_placement(placement) {
            prompt.push_str(&format!(
                "\n{}\nWhite pieces: UPPERCASE (R N B Q K P)\nBlack pieces: lowercase (r n b q k p)\n",
                board.diagram(req.side_to_move)
            ));
        }
    }

    if !req.legal_moves.is_empty() {
        prompt.push_str(&format!("\nLegal moves: {}\n", req.legal_moves.join(", ")));
    }

    prompt.push_str(&format!(
        "\nIt is {side}'s turn. Respond only with the single best move as a {} elo player.",
        req.elo_skill
    ));
    prompt
}

/// Pull a move token out of a model reply: first non-empty line, first
/// word that is not a move number, without quotes, backticks or trailing
/// punctuation.
pub fn clean_reply(text: &str) -> Option<String> {
    let line = text
        .lines()
        .map(|l| l.trim().trim_matches('`').trim())
        .find(|l| !l.is_empty())?;

    let token = line
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | ',' | ';')))
        .map(|w| w.trim_end_matches('.'))
        .find(|w| !w.is_empty() && !is_move_number(w))?;

    // "1.e4" / "12...Nf6" carry the number glued to the move.
    let token = match token.rfind('.') {
        Some(idx) if is_move_number(&token[..=idx]) => &token[idx + 1..],
        _ => token,
    };

    (!token.is_empty()).then(|| token.to_string())
}

/// "1." or "12..." style prefixes.
fn is_move_number(word: &str) -> bool {
    let digits = word.trim_end_matches('.');
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::game::GameState;

    #[test]
    fn prompt_mentions_the_essentials() {
        let mut game = GameState::new();
        game.apply_token("e4").unwrap();
        let req = SuggestRequest::from_game(&game, 1200);
        let prompt = build_prompt(&req);
        assert!(prompt.contains("1200 elo"));
        assert!(prompt.contains("playing Black"));
        assert!(prompt.contains("committed moves: e4"));
        assert!(prompt.contains("not in check"));
        assert!(prompt.contains(&game.to_fen()));
        assert!(prompt.contains("Legal moves: "));
        // Black's diagram has rank 1 at the top.
        assert!(prompt.contains("1 R N B Q K B N R"));
    }

    #[test]
    fn clean_reply_variants() {
        assert_eq!(clean_reply("e5"), Some("e5".into()));
        assert_eq!(clean_reply("  Nf6\n"), Some("Nf6".into()));
        assert_eq!(clean_reply("`Nc6`"), Some("Nc6".into()));
        assert_eq!(clean_reply("**Bb4+**"), Some("Bb4+".into()));
        assert_eq!(clean_reply("1... e5"), Some("e5".into()));
        assert_eq!(clean_reply("12.Qxf7#"), Some("Qxf7#".into()));
        assert_eq!(clean_reply("\n\nO-O.\nBecause it is safe"), Some("O-O".into()));
        assert_eq!(clean_reply("\"d5\""), Some("d5".into()));
        assert_eq!(clean_reply("   \n  "), None);
    }
}
