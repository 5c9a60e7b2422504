//! System and user prompts sent to the model.
//!
//! The three modes differ only in how a click addresses its target:
//! screen fractions, labeled boxes drawn over the screenshot, or visible text.

use std::fmt;

pub const USER_QUESTION: &str = "Hello, I can help you with anything. What would you like done?";

const FIRST_USER_PROMPT: &str = "Please take the next best action. Your output will be parsed as JSON. \
Remember you only have the following 4 operations available: click, write, press, done\n\n\
You just started, so you are in the terminal app and your code is running in this terminal tab. \
To leave the terminal, search for a new program on the OS.\n\nAction:";

const USER_PROMPT: &str = "Please take the next best action. Your output will be parsed as JSON. \
Remember you only have the following 4 operations available: click, write, press, done\n\nAction:";

/// How the model is told to address click targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// `x`/`y` as fractions of the screen.
    Standard,
    /// `label` ids of boxes drawn over the screenshot.
    Labeled,
    /// `text` found on screen by OCR.
    Ocr,
}

impl PromptMode {
    pub fn for_model(model: &str) -> Self {
        match model {
            "gpt-4-with-som" => PromptMode::Labeled,
            "gpt-4-with-ocr" | "gpt-4.1-with-ocr" | "o1-with-ocr" | "claude-3" | "qwen-vl"
            | "o3" | "o4-mini" => PromptMode::Ocr,
            _ => PromptMode::Standard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Mac,
    Windows,
    Linux,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            HostOs::Mac
        } else if cfg!(target_os = "windows") {
            HostOs::Windows
        } else {
            HostOs::Linux
        }
    }

    /// Modifier for app shortcuts, as a JSON string literal.
    fn cmd_key(self) -> &'static str {
        match self {
            HostOs::Mac => "\"command\"",
            HostOs::Windows | HostOs::Linux => "\"ctrl\"",
        }
    }

    /// Key list that opens the OS search, as a JSON array literal.
    fn search_keys(self) -> &'static str {
        match self {
            HostOs::Mac => "[\"command\", \"space\"]",
            HostOs::Windows | HostOs::Linux => "[\"win\"]",
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HostOs::Mac => "Mac",
            HostOs::Windows => "Windows",
            HostOs::Linux => "Linux",
        })
    }
}

pub fn system_prompt(model: &str, objective: &str, os: HostOs) -> String {
    let mode = PromptMode::for_model(model);
    tracing::debug!("system prompt for model {model:?}: {mode:?}");

    let mut prompt = format!(
        "You are operating a {os} computer, using the same operating system as a human.\n\n\
From looking at the screen, the objective, and your previous actions, take the next best series of actions.\n\n\
You have 4 possible operations available to you. Your output will be parsed as JSON, so return only the JSON.\n\n"
    );

    prompt.push_str(click_section(mode));
    prompt.push_str(OTHER_OPERATIONS);
    prompt.push_str("Return the actions in array format `[]`. You can take just one action or multiple actions.\n\n");
    prompt.push_str(SCROLLING_GUIDANCE);
    prompt.push_str(when_to_scroll(mode));
    prompt.push_str("\nHere are helpful examples:\n\n");
    prompt.push_str(&examples(mode, os));
    prompt.push_str(notes(mode));
    prompt.push_str(&format!("\nObjective: {objective}\n"));
    prompt
}

pub fn user_prompt() -> &'static str {
    USER_PROMPT
}

pub fn first_user_prompt() -> &'static str {
    FIRST_USER_PROMPT
}

fn click_section(mode: PromptMode) -> &'static str {
    match mode {
        PromptMode::Standard => {
            r#"1. click - Move the mouse and click. "x" and "y" are fractions of the screen's width and height in decimal format, between 0 and 1.
```
[{ "thought": "write a thought here", "operation": "click", "x": "x fraction (e.g. 0.10)", "y": "y fraction (e.g. 0.13)" }]
```

"#
        }
        PromptMode::Labeled => {
            r#"1. click - Move the mouse and click. The clickable elements are outlined with red bounding boxes and IDs. Label IDs look like `~x` where `x` is a number.
```
[{ "thought": "write a thought here", "operation": "click", "label": "~x" }]
```

"#
        }
        PromptMode::Ocr => {
            r#"1. click - Move the mouse and click. Look for text to click. If nothing relevant is visible, return `"nothing to click"` as the text and a different method will be tried.
```
[{ "thought": "write a thought here", "operation": "click", "text": "The text in the button or link to click" }]
```

"#
        }
    }
}

const OTHER_OPERATIONS: &str = r#"2. write - Type with the keyboard
```
[{ "thought": "write a thought here", "operation": "write", "content": "text to write here" }]
```

3. press - Press a key, or a hotkey when several keys are listed
```
[{ "thought": "write a thought here", "operation": "press", "keys": ["keys to use"] }]
```

4. done - The objective is completed
```
[{ "thought": "write a thought here", "operation": "done", "summary": "summary of what was completed" }]
```

"#;

const SCROLLING_GUIDANCE: &str = r#"SCROLLING GUIDANCE:
When an element or content you need is not visible on the screen, scroll with the "press" operation:

- Scroll down: `press` with keys `["pagedown"]`, or `["down"]` for smaller movements
- Scroll up: `press` with keys `["pageup"]`, or `["up"]` for smaller movements
- Scroll to bottom: `press` with keys `["end"]`
- Scroll to top: `press` with keys `["home"]`

"#;

fn when_to_scroll(mode: PromptMode) -> &'static str {
    match mode {
        PromptMode::Standard => {
            "WHEN TO SCROLL:\n\
- A button, link, or element that should exist is not on screen\n\
- You are working with long web pages, documents, or lists\n\
- Content looks cut off at the top or bottom of the screen\n\
- The page uses infinite scroll or pagination\n\
- Scroll bars show that more content is available\n"
        }
        PromptMode::Labeled => {
            "WHEN TO SCROLL:\n\
- A labeled element that should exist is not on screen\n\
- You are working with long web pages, documents, or lists\n\
- Content looks cut off at the top or bottom of the screen\n\
- The page uses infinite scroll or pagination\n\
- The labeled elements visible don't include what you're looking for\n"
        }
        PromptMode::Ocr => {
            "WHEN TO SCROLL:\n\
- You cannot find text to click that matches the objective\n\
- You are working with long web pages, documents, or lists\n\
- Content looks cut off at the top or bottom of the screen\n\
- The page uses infinite scroll or pagination\n\
- The visible text doesn't include what you're looking for\n"
        }
    }
}

fn examples(mode: PromptMode, os: HostOs) -> String {
    let search = os.search_keys();
    let cmd = os.cmd_key();

    let open_chrome = format!(
        r#"Example: Search the OS for Google Chrome and open it
```
[
    {{ "thought": "I am in the terminal, so I'll open the OS search", "operation": "press", "keys": {search} }},
    {{ "thought": "Now I type 'Google Chrome'", "operation": "write", "content": "Google Chrome" }},
    {{ "thought": "Enter opens Google Chrome if it is installed", "operation": "press", "keys": ["enter"] }}
]
```

"#
    );

    let address_bar = format!(
        r#"Example: Focus the browser address bar before typing a website
```
[
    {{ "thought": "The browser is open, so I'll focus the address bar", "operation": "press", "keys": [{cmd}, "l"] }},
    {{ "thought": "With the address bar focused I can type the URL", "operation": "write", "content": "https://news.ycombinator.com/" }},
    {{ "thought": "Enter loads the URL", "operation": "press", "keys": ["enter"] }}
]
```

"#
    );

    let specific = match mode {
        PromptMode::Standard => {
            r#"Example: Scroll down to find the submit button of a long form
```
[
    { "thought": "I see a form but no submit button. I'll scroll down", "operation": "press", "keys": ["pagedown"] },
    { "thought": "The submit button is now near the bottom of the screen", "operation": "click", "x": "0.50", "y": "0.85" }
]
```

Example: Scroll up to find the navigation menu
```
[
    { "thought": "The navigation menu is at the top of the page. I'll scroll up", "operation": "press", "keys": ["home"] },
    { "thought": "The navigation menu is visible now", "operation": "click", "x": "0.20", "y": "0.15" }
]
```

"#
        }
        PromptMode::Labeled => {
            r#"Example: Send a "Hello World" message in the chat
```
[
    { "thought": "The message field near the button has a label", "operation": "click", "label": "~34" },
    { "thought": "The field is focused, so I'll type the message", "operation": "write", "content": "Hello World" }
]
```

Example: Scroll down to find a labeled submit button
```
[
    { "thought": "None of the labeled elements is a submit button. I'll scroll down to see more", "operation": "press", "keys": ["pagedown"] },
    { "thought": "The submit button has label ~47", "operation": "click", "label": "~47" }
]
```

"#
        }
        PromptMode::Ocr => {
            r#"Example: Search for someone on LinkedIn when already on linkedin.com
```
[
    { "thought": "I see the search field with the placeholder 'search'", "operation": "click", "text": "search" },
    { "thought": "The field is active, so I'll type the name", "operation": "write", "content": "John Doe" },
    { "thought": "Enter submits the search form", "operation": "press", "keys": ["enter"] }
]
```

Example: Scroll down to find a "Sign Up" button
```
[
    { "thought": "There is no 'Sign Up' button in view. I'll scroll down", "operation": "press", "keys": ["pagedown"] },
    { "thought": "The 'Sign Up' button is visible now", "operation": "click", "text": "Sign Up" }
]
```

Example: Scroll up to the navigation menu
```
[
    { "thought": "The main navigation is at the top of the page. I'll scroll to the top", "operation": "press", "keys": ["home"] },
    { "thought": "I can see the navigation menu, so I'll click About", "operation": "click", "text": "About" }
]
```

"#
        }
    };

    format!("{open_chrome}{address_bar}{specific}")
}

fn notes(mode: PromptMode) -> &'static str {
    match mode {
        PromptMode::Standard => {
            "A few important notes:\n\n\
- Go to Google Docs and Google Sheets by typing in the Chrome address bar\n\
- Don't respond saying you're unable to assist with requests. You interact with the user's OS through the actions you return.\n\
- Consider scrolling if you cannot find expected elements in the current view\n"
        }
        PromptMode::Labeled => {
            "A few important notes:\n\n\
- Go to Google Docs and Google Sheets by typing in the Chrome address bar\n\
- Don't respond saying you're unable to assist with requests. You interact with the user's OS through the actions you return.\n\
- Consider scrolling if the visible labeled elements don't include what you need\n\
- After scrolling, elements may be labeled with different IDs\n"
        }
        PromptMode::Ocr => {
            "A few important notes:\n\n\
- Default to Google Chrome as the browser\n\
- Go to websites by opening a new tab with `press` and then `write` the URL\n\
- Check the screenshot against your previous actions to confirm they worked\n\
- If clicking a button or link didn't work the first time, don't click it again. Try something else.\n\
- Don't respond saying you're unable to assist with requests. You interact with the user's OS through the actions you return.\n\
- Use pagedown for faster navigation and down for precise control\n"
        }
    }
}
