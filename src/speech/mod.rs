//! Read-aloud playback of the plan's voice script.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::ux::Tab;
use crate::wire::FitnessPlan;

/// Intro, the section for the active tab, closing.
pub fn voice_text(plan: &FitnessPlan, tab: Tab) -> String {
    let v = &plan.voice_script;
    let middle = match tab {
        Tab::Workout => &v.workout_section,
        Tab::Diet => &v.diet_section,
    };
    format!("{} {} {}", v.intro, middle, v.closing)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceEvent {
    Start,
    End,
    Error,
}

pub trait SpeechEngine {
    fn is_supported(&self) -> bool;
    /// Something is being spoken right now, whoever started it.
    fn is_busy(&mut self) -> bool;
    fn start(&mut self, text: &str) -> Result<()>;
    fn cancel(&mut self);
    /// Completion of the current utterance, if it happened since last poll.
    fn poll(&mut self) -> Option<UtteranceEvent>;
}

pub struct Speaker<E: SpeechEngine> {
    engine: E,
    speaking: bool,
}

impl<E: SpeechEngine> Speaker<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, speaking: false }
    }

    pub fn speaking(&self) -> bool {
        self.speaking
    }

    pub fn supported(&self) -> bool {
        self.engine.is_supported()
    }

    /// No-op when unsupported or already speaking. Returns whether playback
    /// started.
    pub fn speak(&mut self, text: &str) -> bool {
        if !self.engine.is_supported() || self.speaking {
            return false;
        }
        if self.engine.is_busy() {
            self.engine.cancel();
        }
        match self.engine.start(text) {
            Ok(()) => {
                self.on_event(UtteranceEvent::Start);
                true
            }
            Err(e) => {
                tracing::warn!("speech failed to start: {e:#}");
                self.on_event(UtteranceEvent::Error);
                false
            }
        }
    }

    pub fn cancel(&mut self) {
        if !self.engine.is_supported() {
            return;
        }
        self.engine.cancel();
        self.speaking = false;
    }

    pub fn poll(&mut self) {
        if let Some(ev) = self.engine.poll() {
            self.on_event(ev);
        }
    }

    fn on_event(&mut self, ev: UtteranceEvent) {
        self.speaking = matches!(ev, UtteranceEvent::Start);
    }
}

/// Speaks through a system TTS program (`espeak-ng`, `espeak` or `say`).
pub struct CommandEngine {
    program: Option<PathBuf>,
    child: Option<Child>,
}

impl CommandEngine {
    pub fn detect() -> Self {
        let program = ["espeak-ng", "espeak", "say"]
            .iter()
            .find_map(|p| which::which(p).ok());
        if let Some(p) = &program {
            tracing::debug!("speech via {}", p.display());
        }
        Self { program, child: None }
    }
}

/// espeak treats a leading `-` in the text as an option unless `--` comes
/// first.
fn speech_args<'a>(program: &Path, text: &'a str) -> Vec<&'a str> {
    let name = program.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if name.starts_with("espeak") {
        vec!["--", text]
    } else {
        vec![text]
    }
}

impl SpeechEngine for CommandEngine {
    fn is_supported(&self) -> bool {
        self.program.is_some()
    }

    fn is_busy(&mut self) -> bool {
        match self.child.as_mut() {
            Some(c) => matches!(c.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn start(&mut self, text: &str) -> Result<()> {
        let program = self.program.as_ref().ok_or_else(|| anyhow!("no speech program found"))?;
        let child = Command::new(program)
            .args(speech_args(program, text))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", program.display()))?;
        self.child = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
        }
    }

    fn poll(&mut self) -> Option<UtteranceEvent> {
        let status = self.child.as_mut()?.try_wait();
        match status {
            Ok(None) => None,
            Ok(Some(s)) => {
                self.child = None;
                Some(if s.success() { UtteranceEvent::End } else { UtteranceEvent::Error })
            }
            Err(_) => {
                self.child = None;
                Some(UtteranceEvent::Error)
            }
        }
    }
}

impl Drop for CommandEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::tests::sample_plan;

    #[derive(Default)]
    struct FakeEngine {
        unsupported: bool,
        busy: bool,
        fail_start: bool,
        started: Vec<String>,
        cancels: usize,
        pending: Option<UtteranceEvent>,
    }

    impl SpeechEngine for &mut FakeEngine {
        fn is_supported(&self) -> bool {
            !self.unsupported
        }
        fn is_busy(&mut self) -> bool {
            self.busy
        }
        fn start(&mut self, text: &str) -> Result<()> {
            if self.fail_start {
                return Err(anyhow!("boom"));
            }
            self.started.push(text.to_string());
            self.busy = true;
            Ok(())
        }
        fn cancel(&mut self) {
            self.cancels += 1;
            self.busy = false;
        }
        fn poll(&mut self) -> Option<UtteranceEvent> {
            self.pending.take()
        }
    }

    #[test]
    fn espeak_text_cannot_be_read_as_an_option() {
        let text = "-- warm up first";
        assert_eq!(speech_args(Path::new("/usr/bin/espeak-ng"), text), ["--", text]);
        assert_eq!(speech_args(Path::new("espeak"), text), ["--", text]);
        assert_eq!(speech_args(Path::new("/usr/bin/say"), text), [text]);
    }

    #[test]
    fn voice_text_follows_tab() {
        let plan = sample_plan();
        assert_eq!(voice_text(&plan, Tab::Workout), "Hey Asha, welcome. Here is your workout. You've got this!");
        assert_eq!(voice_text(&plan, Tab::Diet), "Hey Asha, welcome. Here is your diet. You've got this!");
    }

    #[test]
    fn speak_while_speaking_is_a_noop() {
        let mut fake = FakeEngine::default();
        {
            let mut s = Speaker::new(&mut fake);
            assert!(s.speak("one"));
            assert!(s.speaking());
            assert!(!s.speak("two"));
        }
        assert_eq!(fake.started, ["one"]);
    }

    #[test]
    fn end_event_allows_next_utterance() {
        let mut fake = FakeEngine::default();
        let mut s = Speaker::new(&mut fake);
        s.speak("one");
        s.engine.pending = Some(UtteranceEvent::End);
        s.poll();
        assert!(!s.speaking());
        // engine still reports busy, so the next speak cancels first
        assert!(s.speak("two"));
        assert_eq!(s.engine.cancels, 1);
    }

    #[test]
    fn unsupported_engine_does_nothing() {
        let mut fake = FakeEngine { unsupported: true, ..Default::default() };
        let mut s = Speaker::new(&mut fake);
        assert!(!s.speak("hi"));
        s.cancel();
        assert_eq!(s.engine.cancels, 0);
        assert!(s.engine.started.is_empty());
    }

    #[test]
    fn start_failure_clears_speaking() {
        let mut fake = FakeEngine { fail_start: true, ..Default::default() };
        let mut s = Speaker::new(&mut fake);
        assert!(!s.speak("hi"));
        assert!(!s.speaking());
    }

    #[test]
    fn cancel_stops_playback() {
        let mut fake = FakeEngine::default();
        let mut s = Speaker::new(&mut fake);
        s.speak("one");
        s.cancel();
        assert!(!s.speaking());
        assert_eq!(s.engine.cancels, 1);
    }
}
