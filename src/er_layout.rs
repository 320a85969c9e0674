use crate::dot_graph::{Engine, Style};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub k: f64,
    pub repulsive_force: f64,
    pub overlap_scaling: f64,
    /// Use `neato` with overlap removal; the three parameters above are then
    /// ignored.
    pub use_neato: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            k: 0.4,
            repulsive_force: 4.0,
            overlap_scaling: -4.0,
            use_neato: false,
        }
    }
}

impl LayoutOptions {
    pub fn engine(&self) -> Engine {
        if self.use_neato {
            Engine::Neato
        } else {
            Engine::Sfdp
        }
    }

    pub fn graph_attributes(&self) -> Style {
        if self.use_neato {
            Style::new().with("overlap", "false")
        } else {
            Style::new()
                .with("overlap_scaling", self.overlap_scaling.to_string())
                .with("K", self.k.to_string())
                .with("repulsiveforce", self.repulsive_force.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub format: String,
    pub layout: LayoutOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: "pdf".to_string(),
            layout: LayoutOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_uses_sfdp_with_tuning() {
        let layout = LayoutOptions::default();
        assert_eq!(layout.engine(), Engine::Sfdp);
        assert_eq!(
            layout.graph_attributes(),
            Style::new()
                .with("overlap_scaling", "-4")
                .with("K", "0.4")
                .with("repulsiveforce", "4")
        );
    }

    #[test]
    fn neato_ignores_tuning() {
        let layout = LayoutOptions {
            use_neato: true,
            k: 2.5,
            ..LayoutOptions::default()
        };
        assert_eq!(layout.engine(), Engine::Neato);
        assert_eq!(layout.graph_attributes(), Style::new().with("overlap", "false"));
    }

    #[test]
    fn tuning_is_passed_through() {
        let layout = LayoutOptions {
            k: 1.25,
            repulsive_force: 0.5,
            overlap_scaling: 3.0,
            use_neato: false,
        };
        let attrs = layout.graph_attributes();
        assert_eq!(attrs.get("K"), Some("1.25"));
        assert_eq!(attrs.get("repulsiveforce"), Some("0.5"));
        assert_eq!(attrs.get("overlap_scaling"), Some("3"));
    }

    #[test]
    fn default_format_is_pdf() {
        assert_eq!(RenderOptions::default().format, "pdf");
    }
}
