use transfer_shared::Locale;

/// Customer-facing copy for booking outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    IncompleteTrip,
    InvalidPassengers,
    UnknownLocation,
    ReturnBeforeOutbound,
    VehicleRequired,
    NoVehiclesForRoute,
    VehicleTooSmall,
    ContactRequired,
    AvailabilityExhausted,
    GenericFailure,
    BookingRequested,
    BookingDetected,
}

pub struct BookingMessages;

impl BookingMessages {
    pub fn template(key: MessageKey, locale: Locale) -> &'static str {
        use MessageKey::*;

        match (locale, key) {
            (Locale::Es, IncompleteTrip) => "Por favor, completa los campos obligatorios del trayecto.",
            (Locale::En, IncompleteTrip) => "Please complete the required fields for the journey.",
            (Locale::Es, InvalidPassengers) => "El número de pasajeros no es válido para este trayecto.",
            (Locale::En, InvalidPassengers) => "The number of passengers is not valid for this journey.",
            (Locale::Es, UnknownLocation) => "El origen o destino seleccionado no está disponible.",
            (Locale::En, UnknownLocation) => "The selected origin or destination is not available.",
            (Locale::Es, ReturnBeforeOutbound) => "La vuelta debe ser posterior a la ida.",
            (Locale::En, ReturnBeforeOutbound) => "The return must be after the outbound journey.",
            (Locale::Es, VehicleRequired) => "Por favor, elige un vehículo.",
            (Locale::En, VehicleRequired) => "Please choose a vehicle.",
            (Locale::Es, NoVehiclesForRoute) => "No hay vehículos definidos para esta ruta.",
            (Locale::En, NoVehiclesForRoute) => "No vehicles defined for this route.",
            (Locale::Es, VehicleTooSmall) => "El vehículo elegido no admite tantos pasajeros.",
            (Locale::En, VehicleTooSmall) => "The chosen vehicle cannot seat that many passengers.",
            (Locale::Es, ContactRequired) => "Por favor, indica tu email y nombre.",
            (Locale::En, ContactRequired) => "Please provide your email and name.",
            (Locale::Es, AvailabilityExhausted) => "DISPONIBILIDAD AGOTADA: Lo sentimos, ya no quedan vehículos libres para las {hour} de ese día. Por favor, selecciona otra hora.",
            (Locale::En, AvailabilityExhausted) => "AVAILABILITY EXHAUSTED: Sorry, no free vehicles left for {hour} that day. Please select another time.",
            (Locale::Es, GenericFailure) => "Hubo un error al procesar tu solicitud.",
            (Locale::En, GenericFailure) => "There was an error processing your request.",
            (Locale::Es, BookingRequested) => "¡Reserva solicitada con éxito!",
            (Locale::En, BookingRequested) => "Booking requested successfully!",
            (Locale::Es, BookingDetected) => "He detectado una solicitud de reserva. He preparado el formulario con los datos extraídos.\n\nOrigen: {origin}\nDestino: {destination}\nFecha: {date}",
            (Locale::En, BookingDetected) => "I detected a booking request and prepared the form with the details I found.\n\nFrom: {origin}\nTo: {destination}\nDate: {date}",
        }
    }

    pub fn text(key: MessageKey, locale: Locale) -> String {
        Self::template(key, locale).to_string()
    }

    /// `hour` is already formatted as `HH:00`.
    pub fn availability_exhausted(hour: &str, locale: Locale) -> String {
        Self::template(MessageKey::AvailabilityExhausted, locale).replace("{hour}", hour)
    }

    pub fn render(key: MessageKey, locale: Locale, values: &[(&str, &str)]) -> String {
        values
            .iter()
            .fold(Self::template(key, locale).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }
}
