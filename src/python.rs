use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::line_lexer::XQueryLexer;
use crate::mode::Mode;
use crate::tables::expected_token_names;

/// Python wrapper around one line lexer and its semantic cache
#[pyclass(name = "Lexer")]
#[derive(Debug, Default)]
struct Lexer {
    inner: XQueryLexer,
}

#[pymethods]
impl Lexer {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    /// Tokenize one line; returns ([(type, value)], state)
    #[pyo3(signature = (line, state=None, row=0))]
    fn tokenize_line(
        &mut self,
        line: &str,
        state: Option<&str>,
        row: usize,
    ) -> (Vec<(String, String)>, String) {
        let lt = self.inner.tokenize_line(line, state, row);
        let tokens = lt.tokens.into_iter().map(|t| (t.kind, t.value)).collect();
        (tokens, lt.state)
    }

    /// Cache analyzer tokens, given as a JSON batch, for the text the row was
    /// last tokenized with; False when the row was never tokenized
    #[pyo3(text_signature = "($self, batch_json)")]
    fn apply_semantic_tokens(&mut self, batch_json: &str) -> PyResult<bool> {
        self.inner
            .apply_semantic_json(batch_json)
            .map_err(|e| PyValueError::new_err(format!("Invalid semantic token batch: {}", e)))
    }

    /// Terminals admissible at the start of a mode
    #[staticmethod]
    #[pyo3(text_signature = "(mode)")]
    fn expected_tokens(mode: &str) -> PyResult<Vec<&'static str>> {
        let mode: Mode = mode
            .parse()
            .map_err(|e| PyValueError::new_err(format!("{}", e)))?;
        Ok(expected_token_names(mode.token_set()))
    }
}

/// XQuery line tokenizer for editor syntax modes
#[pymodule]
fn xqlex(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<Lexer>()?;
    Ok(())
}
