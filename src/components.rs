//! Yew view components for the prayer board.
//!
//! Everything here renders from a [`RenderViewModel`]; none of it talks to
//! the engine directly. The one stateful piece is [`LocationForm`], which
//! only holds its own input text.

use prayer_clock::preferences::Coordinates;
use prayer_clock::view_model::{PrayerRow, RenderViewModel};
use std::rc::Rc;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Props shared by the board panels.
#[derive(Properties, PartialEq)]
pub struct BoardProps {
    pub view: Rc<RenderViewModel>,
}

/// Clock, dates and location.
#[function_component(ClockPanel)]
pub fn clock_panel(props: &BoardProps) -> Html {
    let vm = &props.view;
    html! {
        <div class="clock-panel">
            <div class="current-time">{ &vm.current_time }</div>
            <div class="current-day">{ &vm.current_day }</div>
            <div class="dates">
                <span class="gregorian-date">{ &vm.gregorian_date }</span>
                <span class="hijri-date">{ &vm.hijri_date }</span>
            </div>
            <div class={classes!("location", vm.snapshot_error.then_some("error"))}>
                { &vm.location_label }
                if let Some(temperature) = &vm.temperature {
                    <span class="temperature">{ temperature }</span>
                }
            </div>
            <div class="home-location">{ &vm.home_location_label }</div>
        </div>
    }
}

/// Next prayer, its countdowns, and the current period.
#[function_component(NextPrayerPanel)]
pub fn next_prayer_panel(props: &BoardProps) -> Html {
    let vm = &props.view;
    html! {
        <div class="next-prayer-panel">
            <div class="next-prayer-summary">{ &vm.next_prayer_summary }</div>
            <div class="next-prayer-times">
                <span>{ format!("Azan: {}", vm.next_azan) }</span>
                <span>{ format!("Jamaat: {}", vm.next_jamaat) }</span>
            </div>
            if let Some(countdown) = &vm.jamaat_countdown {
                <div class="jamaat-countdown">
                    { format!("Jamaat in {}", countdown) }
                </div>
            }
            if let Some(countdown) = &vm.post_jamaat_countdown {
                <div class="post-jamaat-countdown">
                    { format!("Jamaat started {} ago", countdown) }
                </div>
            }
            <div class="current-period">
                { format!("{}: {} - {}",
                          vm.current_period_name,
                          vm.current_period_start,
                          vm.current_period_end) }
            </div>
            <div class="fasting-times">
                <span>{ format!("Sahr: {}", vm.sahr) }</span>
                <span>{ format!("Iftar: {}", vm.iftar) }</span>
            </div>
        </div>
    }
}

fn render_prayer_row(row: &PrayerRow, next_name: &str) -> Html {
    let is_next = row.label.eq_ignore_ascii_case(next_name);
    html! {
        <tr key={row.key} class={classes!(is_next.then_some("next-prayer"))}>
            <td>{ &row.label }</td>
            <td>{ &row.azan }</td>
            <td>{ &row.jamaat }</td>
        </tr>
    }
}

/// Azan and jamaat for each prayer, in fixed order.
#[function_component(PrayerTable)]
pub fn prayer_table(props: &BoardProps) -> Html {
    let vm = &props.view;
    html! {
        <table class="prayer-table">
            <thead>
                <tr>
                    <th>{ "Prayer" }</th>
                    <th>{ "Azan" }</th>
                    <th>{ "Jamaat" }</th>
                </tr>
            </thead>
            <tbody>
                { vm.prayer_rows.iter()
                    .map(|row| render_prayer_row(row, &vm.next_prayer_name))
                    .collect::<Html>() }
                if let Some(khutbah) = &vm.khutbah {
                    <tr class="khutbah-row">
                        <td>{ "Khutbah" }</td>
                        <td colspan="2">{ khutbah }</td>
                    </tr>
                }
            </tbody>
        </table>
    }
}

#[function_component(AuxTimes)]
pub fn aux_times(props: &BoardProps) -> Html {
    let vm = &props.view;
    let entries = [
        ("Sunrise", &vm.sunrise),
        ("Sunset", &vm.sunset),
        ("Zawal Start", &vm.zawal_start),
        ("Zawal End", &vm.zawal_end),
        ("Tomorrow Fajr", &vm.tomorrow_fajr),
    ];
    html! {
        <div class="aux-times">
            { entries.iter().map(|(label, value)| html! {
                <div class="aux-time">
                    <span class="aux-label">{ *label }</span>
                    <span class="aux-value">{ value.as_str() }</span>
                </div>
            }).collect::<Html>() }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct OfflineIndicatorProps {
    pub online: bool,
}

/// Badge shown while the browser reports no connectivity.
#[function_component(OfflineIndicator)]
pub fn offline_indicator(props: &OfflineIndicatorProps) -> Html {
    if props.online {
        return html! {};
    }
    html! {
        <div class="offline-indicator">
            { "You are offline. Showing cached data." }
        </div>
    }
}

/// Validate latitude/longitude text from the location form.
pub fn parse_coordinates(latitude: &str, longitude: &str) -> Result<Coordinates, String> {
    let lat: f64 = latitude
        .trim()
        .parse()
        .map_err(|_| "Latitude must be a number.".to_string())?;
    let lon: f64 = longitude
        .trim()
        .parse()
        .map_err(|_| "Longitude must be a number.".to_string())?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err("Latitude must be between -90 and 90.".to_string());
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err("Longitude must be between -180 and 180.".to_string());
    }
    Ok(Coordinates::new(lat, lon))
}

#[derive(Properties, PartialEq)]
pub struct LocationFormProps {
    /// Progress or error text from the last submission.
    pub status: Option<AttrValue>,
    pub on_city: Callback<String>,
    pub on_coordinates: Callback<Coordinates>,
    pub on_detect: Callback<()>,
}

/// Set the location by city name, by coordinates, or from the device.
#[function_component(LocationForm)]
pub fn location_form(props: &LocationFormProps) -> Html {
    let city = use_state(String::new);
    let latitude = use_state(String::new);
    let longitude = use_state(String::new);
    let error = use_state(|| None::<String>);

    let text_input = |handle: &UseStateHandle<String>| {
        let handle = handle.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            handle.set(input.value());
        })
    };

    let submit_city = {
        let city = city.clone();
        let error = error.clone();
        let on_city = props.on_city.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let name = city.trim().to_string();
            if name.is_empty() {
                error.set(Some("Please enter a city name.".to_string()));
                return;
            }
            error.set(None);
            on_city.emit(name);
        })
    };

    let submit_coordinates = {
        let latitude = latitude.clone();
        let longitude = longitude.clone();
        let error = error.clone();
        let on_coordinates = props.on_coordinates.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            match parse_coordinates(&latitude, &longitude) {
                Ok(coordinates) => {
                    error.set(None);
                    on_coordinates.emit(coordinates);
                }
                Err(msg) => error.set(Some(msg)),
            }
        })
    };

    let detect = {
        let error = error.clone();
        let on_detect = props.on_detect.clone();
        Callback::from(move |_: MouseEvent| {
            error.set(None);
            on_detect.emit(());
        })
    };

    let message = match (&*error, &props.status) {
        (Some(err), _) => html! { <div class="location-error">{ err }</div> },
        (None, Some(status)) => html! { <div class="location-status">{ status.clone() }</div> },
        (None, None) => html! {},
    };

    html! {
        <div class="location-form">
            <form onsubmit={submit_city}>
                <label for="city">{ "City:" }</label>
                <input id="city" type="text"
                    value={(*city).clone()}
                    oninput={text_input(&city)}
                />
                <button type="submit">{ "Set City" }</button>
            </form>
            <form onsubmit={submit_coordinates}>
                <label for="latitude">{ "Lat:" }</label>
                <input id="latitude" type="text"
                    value={(*latitude).clone()}
                    oninput={text_input(&latitude)}
                />
                <label for="longitude">{ "Lon:" }</label>
                <input id="longitude" type="text"
                    value={(*longitude).clone()}
                    oninput={text_input(&longitude)}
                />
                <button type="submit">{ "Set Coordinates" }</button>
            </form>
            <button type="button" class="detect-location" onclick={detect}>
                { "Detect Location" }
            </button>
            { message }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_are_range_checked() {
        assert_eq!(
            parse_coordinates(" 21.4225 ", "39.8262"),
            Ok(Coordinates::new(21.4225, 39.8262))
        );
        assert!(parse_coordinates("91", "0").is_err());
        assert!(parse_coordinates("0", "-180.5").is_err());
        assert!(parse_coordinates("north", "0").is_err());
    }
}
