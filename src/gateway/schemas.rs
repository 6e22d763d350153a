//! Request body schemas for every resource route.

use crate::gateway::validation::{FieldRule, HTTP_URL, Schema};

pub static CREATE_ASSISTANT: Schema = Schema {
    fields: &[
        FieldRule::string("name").required().max_len(100),
        FieldRule::object("model"),
        FieldRule::object("voice"),
        FieldRule::string("first_message").max_len(1000),
        FieldRule::object("metadata"),
    ],
};

pub static UPDATE_ASSISTANT: Schema = Schema {
    fields: &[
        FieldRule::string("name").max_len(100),
        FieldRule::object("model"),
        FieldRule::object("voice"),
        FieldRule::string("first_message").max_len(1000),
        FieldRule::object("metadata"),
    ],
};

pub static CREATE_FUNCTION: Schema = Schema {
    fields: &[
        FieldRule::string("name").required().min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::object("parameters").required(),
        FieldRule::string("webhook_url").pattern(&HTTP_URL),
        FieldRule::object("metadata"),
    ],
};

pub static UPDATE_FUNCTION: Schema = Schema {
    fields: &[
        FieldRule::string("name").min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::object("parameters"),
        FieldRule::string("webhook_url").pattern(&HTTP_URL),
        FieldRule::object("metadata"),
    ],
};

pub static CREATE_MESSAGE: Schema = Schema {
    fields: &[
        FieldRule::string("role")
            .required()
            .one_of(&["system", "user", "assistant", "function", "tool"]),
        FieldRule::string("content").required(),
        FieldRule::string("name"),
        FieldRule::object("metadata"),
    ],
};

pub static CREATE_TEST_SUITE: Schema = Schema {
    fields: &[
        FieldRule::string("name").required().min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::string("assistant_id").required(),
        FieldRule::object("metadata"),
    ],
};

pub static UPDATE_TEST_SUITE: Schema = Schema {
    fields: &[
        FieldRule::string("name").min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::string("assistant_id"),
        FieldRule::object("metadata"),
    ],
};

pub static CREATE_TEST: Schema = Schema {
    fields: &[
        FieldRule::string("name").required().min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::string("input").required(),
        FieldRule::string("expected_output").required(),
        FieldRule::object("metadata"),
    ],
};

pub static UPDATE_TEST: Schema = Schema {
    fields: &[
        FieldRule::string("name").min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::string("input"),
        FieldRule::string("expected_output"),
        FieldRule::object("metadata"),
    ],
};

pub static START_RUN: Schema = Schema {
    fields: &[
        FieldRule::array("test_ids").min_len(1),
        FieldRule::object("metadata"),
    ],
};

pub static UPDATE_RUN: Schema = Schema {
    fields: &[
        FieldRule::string("status").one_of(&["running", "completed", "failed", "cancelled"]),
        FieldRule::object("results"),
        FieldRule::object("metadata"),
    ],
};

pub static UPDATE_ORGANIZATION: Schema = Schema {
    fields: &[
        FieldRule::string("name").min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::string("webhook_url").pattern(&HTTP_URL),
        FieldRule::array("trusted_origins"),
        FieldRule::object("metadata"),
    ],
};

pub static CREATE_WEBHOOK: Schema = Schema {
    fields: &[
        FieldRule::string("url")
            .required()
            .pattern(&HTTP_URL)
            .message("L'URL du webhook doit être une URL valide"),
        FieldRule::array("events")
            .required()
            .message("Les événements à écouter sont requis"),
        FieldRule::string("description").max_len(255),
        FieldRule::boolean("enabled"),
    ],
};

pub static UPDATE_WEBHOOK: Schema = Schema {
    fields: &[
        FieldRule::string("url")
            .pattern(&HTTP_URL)
            .message("L'URL du webhook doit être une URL valide"),
        FieldRule::array("events"),
        FieldRule::string("description").max_len(255),
        FieldRule::boolean("enabled"),
    ],
};

pub static CREATE_WORKFLOW: Schema = Schema {
    fields: &[
        FieldRule::string("name").required().min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::array("steps").required().min_len(1),
        FieldRule::object("metadata"),
    ],
};

pub static UPDATE_WORKFLOW: Schema = Schema {
    fields: &[
        FieldRule::string("name").min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::array("steps").min_len(1),
        FieldRule::object("metadata"),
    ],
};

pub static EXECUTE_WORKFLOW: Schema = Schema {
    fields: &[
        FieldRule::object("inputs").required(),
        FieldRule::object("metadata"),
    ],
};

pub static CREATE_SQUAD: Schema = Schema {
    fields: &[
        FieldRule::string("name").required().min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::array("members"),
        FieldRule::object("metadata"),
    ],
};

pub static UPDATE_SQUAD: Schema = Schema {
    fields: &[
        FieldRule::string("name").min_len(3).max_len(100),
        FieldRule::string("description").max_len(500),
        FieldRule::object("metadata"),
    ],
};

pub static ADD_SQUAD_MEMBERS: Schema = Schema {
    fields: &[FieldRule::array("members").required().min_len(1)],
};
