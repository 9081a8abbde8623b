use stockduel_game::{
    Answer, BundledLoader, Company, CompanyData, Grade, Phase, Progress, QuizConfig, QuizEngine,
    Screen, SessionError, SessionManager, decode_share_code, panel_rows,
};

fn manager() -> SessionManager {
    QuizEngine::new(BundledLoader).create_manager().unwrap()
}

/// Play the session in progress, answering correctly for the first `correct` rounds.
fn play_through(manager: &mut SessionManager, correct: usize) -> u32 {
    let mut played = 0;
    loop {
        let session = manager.session().unwrap();
        let round = session.current_round().unwrap();
        let guess = if played < correct {
            round.answer
        } else {
            round.answer.flip()
        };
        manager.guess(guess).unwrap();
        manager.finish_reveal().unwrap();
        played += 1;
        if let Progress::Complete { score } = manager.advance().unwrap() {
            return score;
        }
    }
}

#[test]
fn high_score_is_max_of_previous_and_current() {
    let mut manager = manager();
    manager.start(1).unwrap();
    assert_eq!(play_through(&mut manager, 6), 6);
    assert_eq!(manager.high_score(), 6);

    manager.restart(2);
    assert_eq!(play_through(&mut manager, 3), 3);
    assert_eq!(manager.high_score(), 6);

    manager.start(3).unwrap();
    assert_eq!(play_through(&mut manager, 9), 9);
    assert_eq!(manager.high_score(), 9);
    let summary = manager.summary().unwrap();
    assert_eq!(summary.grade, Grade::A);
    assert_eq!(summary.best, 9);
}

#[test]
fn share_code_replays_the_same_rounds() {
    let seed = decode_share_code("SD-ALPHA21").unwrap();
    let mut first = manager();
    let mut second = manager();
    first.start(seed).unwrap();
    second.start(seed).unwrap();
    let a = first.session().unwrap();
    let b = second.session().unwrap();
    assert_eq!(a.rounds(), b.rounds());
    assert_eq!(a.layouts(), b.layouts());

    play_through(&mut first, 10);
    assert_eq!(
        first.summary().unwrap().share_code.as_deref(),
        Some("SD-ALPHA21")
    );
}

#[test]
fn panels_show_relevant_fields_and_requested_distractors() {
    let mut manager = manager();
    manager.start(17).unwrap();
    let session = manager.session().unwrap();
    for (round, layout) in session.rounds().iter().zip(session.layouts()) {
        let spec = round.metric_spec();
        for fields in [&layout.fields_a, &layout.fields_b] {
            assert_eq!(fields.len(), 2 + usize::from(round.distractor_count));
            assert!(spec.relevant.iter().all(|f| fields.contains(f)));
        }
        let rows = panel_rows(&round.company_a, &layout.fields_a);
        assert_eq!(rows.len(), layout.fields_a.len());
        assert!(rows.iter().all(|row| !row.value.is_empty()));
    }
}

#[test]
fn actions_outside_their_phase_are_errors() {
    let mut manager = manager();
    assert!(matches!(
        manager.guess(Answer::Higher),
        Err(SessionError::WrongScreen {
            screen: Screen::Start,
            ..
        })
    ));
    manager.start(4).unwrap();
    assert!(manager.advance().is_err());
    manager.guess(Answer::Lower).unwrap();
    assert!(matches!(
        manager.session().unwrap().phase(),
        Phase::Revealing { .. }
    ));
    assert!(manager.toggle_hint().is_err());
    manager.finish_reveal().unwrap();
    assert!(manager.session().unwrap().reveal().is_some());
    assert_eq!(manager.advance(), Ok(Progress::NextRound));
    assert_eq!(manager.toggle_hint(), Ok(true));
}

#[test]
fn sparse_pools_degrade_instead_of_failing() {
    let mut lone = Company::new("SOLO", "Solo Tbk", "Banks");
    lone.roe = Some(0.12);
    let mut manager =
        SessionManager::new(CompanyData::from_companies(vec![lone]), QuizConfig::default())
            .unwrap();
    assert_eq!(manager.start(1), Ok(Screen::InsufficientData));
    assert!(manager.summary().is_none());
    manager.quit();
    assert_eq!(manager.screen(), Screen::Start);
}

#[test]
fn empty_json_pool_is_handled() {
    let data = CompanyData::from_json("[]").unwrap();
    let mut manager = SessionManager::new(data, QuizConfig::default()).unwrap();
    assert_eq!(manager.restart(9), Screen::InsufficientData);
}
