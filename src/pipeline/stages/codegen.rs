//! Code-Generation Stage
//!
//! Emits the website source artifact: one self-contained HTML document
//! with React, the JSX transform, and styling loaded from CDNs, and the
//! structured content embedded as `CONTENT_DATA`.
//!
//! This is the one document-form stage: raw model output goes through the
//! artifact sanitizer instead of the JSON recovery engine, and validation
//! checks boilerplate markers instead of a field schema. The fallback is
//! not a canned string but a deterministic template rendered from the
//! workspace, so even a fully degraded run ships a working site.

use serde_json::{Value, json};

use crate::pipeline::runner::{OutputForm, PipelineStage, Prompt, StageContext};
use crate::pipeline::workspace::StageId;
use crate::schema::StageSchema;
use crate::types::SchemaError;

use super::prompts::StagePrompts;

pub struct CodegenStage;

impl PipelineStage for CodegenStage {
    fn id(&self) -> StageId {
        StageId::Codegen
    }

    fn schema(&self) -> StageSchema {
        // Document-form stage: validation happens in validate_document
        StageSchema::new("site_document", vec![])
    }

    fn output_form(&self) -> OutputForm {
        OutputForm::Document
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Prompt {
        let design = upstream(ctx, StageId::Design);
        let content = upstream(ctx, StageId::Content);
        let layout = upstream(ctx, StageId::Layout);
        let icons = upstream(ctx, StageId::Icons);

        Prompt {
            system: StagePrompts::codegen_system().to_string(),
            user: StagePrompts::codegen_user(
                ctx.input.user_name(),
                &design,
                &content,
                &layout,
                &icons,
                ctx.feedback,
            ),
        }
    }

    fn validate_document(&self, text: &str) -> Result<(), SchemaError> {
        let lower = text.to_lowercase();

        if !lower.contains("<html") || !lower.contains("</html>") {
            return Err(SchemaError::new("artifact is not a complete HTML document")
                .at("site_document"));
        }
        if !text.contains(r#"id="root""#) {
            return Err(SchemaError::new("artifact is missing the root mount point")
                .at("site_document"));
        }
        if !text.contains("CONTENT_DATA") {
            return Err(
                SchemaError::new("artifact does not embed CONTENT_DATA").at("site_document")
            );
        }

        Ok(())
    }

    fn fallback(&self, ctx: &StageContext<'_>) -> Value {
        Value::String(render_fallback_document(ctx))
    }
}

fn upstream(ctx: &StageContext<'_>, stage: StageId) -> Value {
    ctx.workspace.value(stage).cloned().unwrap_or_default()
}

// =============================================================================
// Fallback template
// =============================================================================

/// Render the always-valid single-file site from the workspace state.
///
/// All dynamic data flows through the embedded `CONTENT_DATA`; the JSX
/// reads it at runtime, so the template itself stays static apart from the
/// design tokens and the title.
pub fn render_fallback_document(ctx: &StageContext<'_>) -> String {
    let design = upstream(ctx, StageId::Design);
    let content = upstream(ctx, StageId::Content);

    let site_title = content
        .pointer("/meta/site_title")
        .and_then(Value::as_str)
        .unwrap_or("Professional Fingerprint")
        .to_string();

    let palette = design.get("color_palette").and_then(Value::as_array);
    let color = |idx: usize, default: &str| -> String {
        palette
            .and_then(|p| p.get(idx))
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };

    let primary = color(0, "#0071e3");
    let accent = color(2, "#2997ff");
    let background = color(3, "#000000");
    let text = color(4, "#f5f5f7");

    let heading_font = font(&design, "heading");
    let body_font = font(&design, "body");

    let font_link = format!(
        "https://fonts.googleapis.com/css2?family={}:wght@400;700;900&family={}:wght@400;600&display=swap",
        font_query(&heading_font),
        font_query(&body_font)
    );

    let content_data = embed_json(&content);

    FALLBACK_TEMPLATE
        .replace("__SITE_TITLE__", &escape_html(&site_title))
        .replace("__FONT_LINK__", &font_link)
        .replace("__HEADING_FONT__", &heading_font)
        .replace("__BODY_FONT__", &body_font)
        .replace("__PRIMARY__", &primary)
        .replace("__ACCENT__", &accent)
        .replace("__BACKGROUND__", &background)
        .replace("__TEXT__", &text)
        .replace("__CONTENT_DATA__", &content_data)
}

fn font(design: &Value, role: &str) -> String {
    design
        .pointer(&format!("/typography_pair/{}", role))
        .and_then(Value::as_str)
        .unwrap_or("Inter, sans-serif")
        .to_string()
}

/// Google Fonts family query: the family name before any comma, with
/// spaces encoded
fn font_query(font: &str) -> String {
    font.split(',')
        .next()
        .unwrap_or("Inter")
        .trim()
        .replace(' ', "+")
}

/// Serialize for inline <script> embedding. `</script` inside string
/// values would terminate the script tag early.
fn embed_json(value: &Value) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const FALLBACK_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en" class="scroll-smooth">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>__SITE_TITLE__</title>
    <script src="https://cdn.tailwindcss.com"></script>
    <script src="https://unpkg.com/framer-motion@10/dist/framer-motion.js"></script>
    <script crossorigin src="https://unpkg.com/react@18/umd/react.production.min.js"></script>
    <script crossorigin src="https://unpkg.com/react-dom@18/umd/react-dom.production.min.js"></script>
    <script src="https://unpkg.com/@babel/standalone/babel.min.js"></script>
    <link href="__FONT_LINK__" rel="stylesheet">
    <style>
        body {
            background: __BACKGROUND__;
            color: __TEXT__;
            font-family: __BODY_FONT__;
            margin: 0;
            padding: 0;
        }
        h1, h2, h3 { font-family: __HEADING_FONT__; color: __TEXT__; }
        .glass {
            background: rgba(20, 20, 20, 0.85);
            backdrop-filter: blur(20px);
            border: 1px solid rgba(255, 255, 255, 0.1);
        }
        .gradient-text {
            background: linear-gradient(135deg, __PRIMARY__, __ACCENT__);
            -webkit-background-clip: text;
            -webkit-text-fill-color: transparent;
            background-clip: text;
        }
        .text-accent { color: __ACCENT__; }
    </style>
</head>
<body>
    <div id="root"></div>
    <script type="text/babel">
        const Motion = window.Motion || {};
        const motion = Motion.motion || (({children, ...props}) => React.createElement('div', props, children));
        const AnimatePresence = Motion.AnimatePresence || (({children}) => children);
        const { useState, useEffect } = React;

        const CONTENT_DATA = __CONTENT_DATA__;

        const pages = CONTENT_DATA.pages || {};
        const patterns = (pages.behavioral_patterns || {}).patterns || [];
        const siteTitle = (CONTENT_DATA.meta || {}).site_title || 'Portfolio';

        function Navigation({ currentRoute, setRoute }) {
            const navItems = [
                { id: 'home', label: 'Home' },
                { id: 'patterns', label: 'Patterns', count: patterns.length },
                { id: 'about', label: 'About' }
            ];

            return (
                <nav className="fixed top-0 left-0 right-0 z-50 glass">
                    <div className="max-w-7xl mx-auto px-8 py-4 flex items-center justify-between">
                        <div className="text-xl font-bold gradient-text">{siteTitle}</div>
                        <div className="flex gap-8">
                            {navItems.map(item => (
                                <button
                                    key={item.id}
                                    onClick={() => setRoute(item.id)}
                                    className={`transition-all duration-200 ${currentRoute === item.id ? 'opacity-100 font-semibold text-accent' : 'opacity-60 hover:opacity-100'}`}
                                >
                                    {item.label} {item.count > 0 && `(${item.count})`}
                                </button>
                            ))}
                        </div>
                    </div>
                </nav>
            );
        }

        function HomePage() {
            const home = pages.home || {};
            const intro = home.introduction || [];
            return (
                <motion.div
                    initial={{ opacity: 0 }}
                    animate={{ opacity: 1 }}
                    transition={{ duration: 1 }}
                    className="min-h-screen flex flex-col items-center justify-center px-8 pt-20"
                >
                    <div className="relative z-10 text-center max-w-5xl">
                        <h1 className="text-5xl md:text-7xl font-bold mb-8 tracking-tight gradient-text">
                            {home.thesis || 'Portfolio'}
                        </h1>
                        {intro.map((para, idx) => (
                            <p key={idx} className="text-xl opacity-80 font-light leading-relaxed mb-4">{para}</p>
                        ))}
                    </div>
                </motion.div>
            );
        }

        function PatternsPage() {
            if (patterns.length === 0) {
                return (
                    <div className="min-h-screen flex items-center justify-center px-8 pt-20">
                        <div className="text-center max-w-2xl">
                            <h1 className="text-5xl font-bold mb-8 gradient-text">Patterns</h1>
                            <p className="text-xl opacity-70">No behavioral patterns identified yet.</p>
                        </div>
                    </div>
                );
            }

            return (
                <motion.div initial={{ opacity: 0 }} animate={{ opacity: 1 }} className="min-h-screen px-8 pt-32 pb-20">
                    <div className="max-w-6xl mx-auto">
                        <h1 className="text-5xl font-bold mb-12 gradient-text">
                            {(pages.behavioral_patterns || {}).page_title || 'Behavioral Patterns'}
                        </h1>
                        <div className="grid grid-cols-1 gap-8">
                            {patterns.map((pattern, idx) => (
                                <div key={idx} className="glass rounded-3xl p-8">
                                    <h2 className="text-3xl font-bold mb-4 text-accent">{pattern.name}</h2>
                                    <p className="text-lg opacity-90 mb-4">{pattern.summary}</p>
                                    {(pattern.analysis || []).map((para, pIdx) => (
                                        <p key={pIdx} className="text-base opacity-80 mb-3 leading-relaxed">{para}</p>
                                    ))}
                                </div>
                            ))}
                        </div>
                    </div>
                </motion.div>
            );
        }

        function AboutPage() {
            const about = pages.about || {};
            const intro = about.introduction || [];
            return (
                <div className="min-h-screen flex items-center justify-center px-8 pt-20">
                    <div className="max-w-4xl">
                        <h1 className="text-5xl font-bold mb-8 gradient-text text-center">
                            {about.page_title || 'About'}
                        </h1>
                        {intro.length > 0 ? (
                            <div className="space-y-4">
                                {intro.map((para, idx) => (
                                    <p key={idx} className="text-lg opacity-80 leading-relaxed">{para}</p>
                                ))}
                            </div>
                        ) : (
                            <p className="text-xl opacity-70 text-center">Get in touch to learn more.</p>
                        )}
                    </div>
                </div>
            );
        }

        function App() {
            const [route, setRoute] = useState('home');

            useEffect(() => {
                const handleHashChange = () => {
                    setRoute(window.location.hash.slice(1) || 'home');
                };
                window.addEventListener('hashchange', handleHashChange);
                handleHashChange();
                return () => window.removeEventListener('hashchange', handleHashChange);
            }, []);

            useEffect(() => {
                window.location.hash = route;
            }, [route]);

            return (
                <div className="min-h-screen">
                    <Navigation currentRoute={route} setRoute={setRoute} />
                    <AnimatePresence mode="wait">
                        {route === 'home' && <HomePage key="home" />}
                        {route === 'patterns' && <PatternsPage key="patterns" />}
                        {route === 'about' && <AboutPage key="about" />}
                    </AnimatePresence>
                </div>
            );
        }

        const root = ReactDOM.createRoot(document.getElementById('root'));
        root.render(<App />);
    </script>
</body>
</html>
"##;
