use crate::key::*;

#[test]
fn test_editing_key_table() {
    for vk in [
        VK_ESCAPE, VK_PRIOR, VK_NEXT, VK_END, VK_HOME, VK_LEFT, VK_UP, VK_RIGHT, VK_DOWN,
        VK_INSERT, VK_DELETE, VK_F1, VK_F2, VK_F3, VK_F4, VK_F5, VK_F6, VK_F7, VK_F8, VK_F9,
    ] {
        assert!(
            is_command_line_editing_key(&KeyRecord::from_vk(vk)),
            "vk {vk:#x} should be an editing key"
        );
    }
    // F10 and plain letters are not.
    assert!(!is_command_line_editing_key(&KeyRecord::from_vk(VK_F9 + 1)));
    assert!(!is_command_line_editing_key(&KeyRecord::from_char('a')));

    // Alt suppresses the plain table.
    let alt_home =
        KeyRecord::from_vk(VK_HOME).with_modifiers(Modifiers::LEFT_ALT_PRESSED);
    assert!(!is_command_line_editing_key(&alt_home));

    // With ctrl held, only end/home/left/right qualify.
    for vk in [VK_END, VK_HOME, VK_LEFT, VK_RIGHT] {
        let key = KeyRecord::from_vk(vk).with_modifiers(Modifiers::LEFT_CTRL_PRESSED);
        assert!(is_command_line_editing_key(&key));
    }
    let ctrl_up = KeyRecord::from_vk(VK_UP).with_modifiers(Modifiers::RIGHT_CTRL_PRESSED);
    assert!(!is_command_line_editing_key(&ctrl_up));
}

#[test]
fn test_popup_key_table() {
    for vk in [
        VK_ESCAPE, VK_PRIOR, VK_NEXT, VK_END, VK_HOME, VK_LEFT, VK_UP, VK_RIGHT, VK_DOWN, VK_F2,
        VK_F4, VK_F7, VK_F9,
    ] {
        assert!(
            is_command_line_popup_key(&KeyRecord::from_vk(vk)),
            "vk {vk:#x} should be a popup key"
        );
    }
    for vk in [VK_INSERT, VK_DELETE, VK_F1, VK_F3, VK_F5, VK_F6, VK_F8] {
        assert!(!is_command_line_popup_key(&KeyRecord::from_vk(vk)));
    }
    let ctrl_home = KeyRecord::from_vk(VK_HOME).with_modifiers(Modifiers::LEFT_CTRL_PRESSED);
    assert!(!is_command_line_popup_key(&ctrl_home));
}

#[test]
fn test_winmods_matching() {
    // Pattern 3 is shift plus either ctrl.
    let m = Modifiers::SHIFT_PRESSED | Modifiers::LEFT_CTRL_PRESSED;
    assert!(key_state_matches_winmods(m, 3));
    let m = Modifiers::SHIFT_PRESSED | Modifiers::RIGHT_CTRL_PRESSED;
    assert!(key_state_matches_winmods(m, 3));
    // An extra alt falls outside the pattern.
    let m = Modifiers::SHIFT_PRESSED | Modifiers::LEFT_CTRL_PRESSED | Modifiers::LEFT_ALT_PRESSED;
    assert!(!key_state_matches_winmods(m, 3));
    // Lock lights are not modifiers.
    let m = Modifiers::SHIFT_PRESSED | Modifiers::LEFT_CTRL_PRESSED | Modifiers::CAPSLOCK_ON;
    assert!(key_state_matches_winmods(m, 3));
    // Shift alone is only part of the pattern, which is fine; nothing
    // outside it is pressed.
    assert!(key_state_matches_winmods(Modifiers::SHIFT_PRESSED, 3));
}
